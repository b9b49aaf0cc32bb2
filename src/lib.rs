//! # structured-data
//!
//! Turns terse authoring hints in HTML templates into schema.org structured
//! markup. Template authors write a `data-sd` attribute naming a type and/or
//! property; the rewriter replaces it with either Microdata or RDFa Lite:
//!
//! ```text
//! <article data-sd="Article">           <article itemscope itemtype='https://schema.org/Article'>
//!   <h1 data-sd="headline">       →       <h1 itemprop='headline'>
//!   <time data-sd="datePublished">        <time itemprop='datePublished'>
//! ```
//!
//! # Architecture: Marker → Engine → Fragment
//!
//! ```text
//! 1. Rewrite   document  →  marker attributes   (regex scan of start tags)
//! 2. Parse     marker    →  Marker              ("Type.property Fallback.prop")
//! 3. Render    Marker    →  attribute fragment  (catalog lookup + vocabulary)
//! ```
//!
//! The render step is the core. The [`engine`] asks the [`catalog`] whether a
//! property belongs to the current type (walking the inheritance chain), how
//! it should be displayed, and which fallback applies when it doesn't belong.
//! The [`vocabulary`] then supplies the attribute strings for the selected
//! semantic.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | schema.org type hierarchy: ancestors, property lookup, display classification |
//! | [`vocabulary`] | Microdata and RDFa Lite attribute strings and tag helpers |
//! | [`engine`] | Stateful markup engine over a pure `render` function |
//! | [`marker`] | Parser for `Type.property Fallback.property` marker strings |
//! | [`rewrite`] | Document rewriter: finds `data-{suffix}` attributes and replaces them |
//! | [`batch`] | Parallel rewriting of a whole directory tree |
//! | [`config`] | `structured-data.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Type Table as Data
//!
//! The schema.org hierarchy ships as a JSON table embedded in the binary
//! (`data/schema-org.json`), parsed once on first use. Each property lists its
//! expected types; the first one decides whether the property renders as a
//! plain attribute, opens a nested scope, or needs a `<meta>` element with a
//! machine-readable value. A project with its own vocabulary extensions can
//! point `catalog` in the config at a table in the same format.
//!
//! ## Exclusive Engine, Pure Render
//!
//! [`engine::MarkupEngine`] keeps the chained-setter style
//! (`engine.property("name").content("Jane").display(..)`) but every setter
//! takes `&mut self`. `display` moves the pending fields out and hands them to
//! [`engine::render`], which has no state at all. Rendering can therefore be
//! tested, or used from several threads, without an engine.
//!
//! ## Lenient Resolution
//!
//! Unknown types fall back to `Thing` and unknown properties produce no
//! markup. A typo in a template costs one attribute, never a failed build.
//! Errors are reserved for configuration: an unknown semantic name, an empty
//! suffix, or a malformed type table.
//!
//! ## One Rewriter per Document
//!
//! A rewriter remembers the most recent type across markers, which is what
//! lets `data-sd="headline"` inside an `Article` resolve. When a whole tree is
//! rewritten each file gets a fresh rewriter so state never crosses files.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod marker;
pub mod output;
pub mod rewrite;
pub mod vocabulary;

#[cfg(test)]
pub(crate) mod test_helpers;
