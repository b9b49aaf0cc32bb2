//! Document rewriting.
//!
//! A [`Rewriter`] finds `data-{suffix}` marker attributes on start tags and
//! replaces each with the markup its marker resolves to:
//!
//! ```text
//! <article data-sd="Article">          → <article itemscope itemtype='https://schema.org/Article'>
//! <h1 data-sd="headline">              → <h1 itemprop='headline'>
//! <span data-sd="Article.nope">        → <span >
//! ```
//!
//! Start tags are visited in document order. On each tag the registered
//! suffixes are visited in their configured order and the first attribute of
//! each suffix is rewritten. The engine's current type carries over from one
//! marker to the next, and across `rewrite` calls on the same rewriter.
//!
//! Attributes of unregistered suffixes are left alone. The scan is a pair of
//! regular expressions rather than an HTML parser: a `>` inside a quoted
//! attribute value ends the tag early.

use crate::catalog::TypeCatalog;
use crate::engine::{DisplayKind, MarkupEngine};
use crate::marker::parse_marker;
use crate::vocabulary::{Semantic, UnknownSemantic};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SUFFIX: &str = "sd";

static START_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z][^>]*>").expect("invalid start tag regex"));

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    UnknownSemantic(#[from] UnknownSemantic),
    #[error("Marker suffix must not be empty")]
    EmptySuffix,
    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One marker attribute found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEdit {
    /// Byte range of the `data-…=…` text in the source document.
    pub range: Range<usize>,
    pub suffix: String,
    pub marker: String,
    pub replacement: String,
}

/// A rewritten document and the edits that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub html: String,
    pub edits: Vec<MarkerEdit>,
}

impl RewriteOutcome {
    /// Markers that resolved to nothing and were simply removed.
    pub fn unresolved(&self) -> usize {
        self.edits.iter().filter(|e| e.replacement.is_empty()).count()
    }
}

fn normalize_suffix(suffix: &str) -> Result<String, RewriteError> {
    let suffix = suffix.trim().to_lowercase();
    if suffix.is_empty() {
        return Err(RewriteError::EmptySuffix);
    }
    Ok(suffix)
}

/// Attribute pattern for a suffix list; `None` when there are no suffixes.
fn attribute_pattern(suffixes: &[String]) -> Result<Option<Regex>, regex::Error> {
    if suffixes.is_empty() {
        return Ok(None);
    }
    let alternatives = suffixes
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"(?i)\s(?P<attr>data-(?P<suffix>{alternatives})\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+)))"#
    );
    Regex::new(&pattern).map(Some)
}

#[derive(Debug, Clone)]
pub struct Rewriter<'c> {
    engine: MarkupEngine<'c>,
    suffixes: Vec<String>,
    attribute: Option<Regex>,
}

impl Rewriter<'static> {
    /// Rewriter over the bundled schema.org table, for a semantic given by
    /// name (`"microdata"` or `"rdfa"`, any case).
    pub fn new(semantic: &str) -> Result<Self, RewriteError> {
        Self::with_catalog(semantic, TypeCatalog::schema_org())
    }
}

impl<'c> Rewriter<'c> {
    pub fn with_catalog(semantic: &str, catalog: &'c TypeCatalog) -> Result<Self, RewriteError> {
        Self::with_semantic(semantic.parse()?, catalog)
    }

    pub fn with_semantic(semantic: Semantic, catalog: &'c TypeCatalog) -> Result<Self, RewriteError> {
        let suffixes = vec![DEFAULT_SUFFIX.to_string()];
        let attribute = attribute_pattern(&suffixes)?;
        Ok(Self {
            engine: MarkupEngine::with_catalog(semantic, catalog),
            suffixes,
            attribute,
        })
    }

    pub fn semantic(&self) -> Semantic {
        self.engine.semantic()
    }

    /// Switch semantics. Starts a fresh engine, so the current type resets
    /// to `Thing`.
    pub fn set_semantic(&mut self, semantic: &str) -> Result<(), RewriteError> {
        let semantic: Semantic = semantic.parse()?;
        self.engine = MarkupEngine::with_catalog(semantic, self.engine.catalog());
        Ok(())
    }

    pub fn engine(&self) -> &MarkupEngine<'c> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MarkupEngine<'c> {
        &mut self.engine
    }

    /// Registered suffixes, lowercase, in processing order.
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Register a suffix. Stored lowercase; registering one twice is a no-op.
    pub fn add_suffix(&mut self, suffix: &str) -> Result<(), RewriteError> {
        let suffix = normalize_suffix(suffix)?;
        if self.suffixes.contains(&suffix) {
            return Ok(());
        }
        self.suffixes.push(suffix);
        self.attribute = attribute_pattern(&self.suffixes)?;
        Ok(())
    }

    pub fn add_suffixes<I, S>(&mut self, suffixes: I) -> Result<(), RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for suffix in suffixes {
            self.add_suffix(suffix.as_ref())?;
        }
        Ok(())
    }

    /// Replace the whole suffix list, keeping its order.
    pub fn set_suffixes<I, S>(&mut self, suffixes: I) -> Result<(), RewriteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for suffix in suffixes {
            let suffix = normalize_suffix(suffix.as_ref())?;
            if !cleaned.contains(&suffix) {
                cleaned.push(suffix);
            }
        }
        self.attribute = attribute_pattern(&cleaned)?;
        self.suffixes = cleaned;
        Ok(())
    }

    /// Unregister a suffix, case-insensitively. Unknown suffixes are ignored.
    pub fn remove_suffix(&mut self, suffix: &str) -> Result<(), RewriteError> {
        let suffix = normalize_suffix(suffix)?;
        let before = self.suffixes.len();
        self.suffixes.retain(|s| *s != suffix);
        if self.suffixes.len() != before {
            self.attribute = attribute_pattern(&self.suffixes)?;
        }
        Ok(())
    }

    /// Rewrite every marker attribute in `html`.
    pub fn rewrite(&mut self, html: &str) -> String {
        self.rewrite_document(html).html
    }

    /// Rewrite every marker attribute in `html`, keeping the list of edits.
    pub fn rewrite_document(&mut self, html: &str) -> RewriteOutcome {
        let found = self.find_markers(html);
        let mut edits = Vec::with_capacity(found.len());
        for (range, suffix, marker) in found {
            let replacement = self.resolve(&marker);
            debug!("data-{suffix}=\"{marker}\" -> \"{replacement}\"");
            edits.push(MarkerEdit {
                range,
                suffix,
                marker,
                replacement,
            });
        }

        let mut ordered: Vec<&MarkerEdit> = edits.iter().collect();
        ordered.sort_by_key(|e| e.range.start);
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for edit in ordered {
            out.push_str(&html[cursor..edit.range.start]);
            out.push_str(&edit.replacement);
            cursor = edit.range.end;
        }
        out.push_str(&html[cursor..]);

        RewriteOutcome { html: out, edits }
    }

    /// Marker attributes in processing order: tags in document order, then
    /// suffixes in configured order, first attribute per suffix.
    fn find_markers(&self, html: &str) -> Vec<(Range<usize>, String, String)> {
        let Some(attribute) = &self.attribute else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for tag in START_TAG.find_iter(html) {
            let mut per_suffix: Vec<Option<(Range<usize>, String)>> = vec![None; self.suffixes.len()];
            for caps in attribute.captures_iter(tag.as_str()) {
                let suffix = caps["suffix"].to_lowercase();
                let Some(slot) = self.suffixes.iter().position(|s| *s == suffix) else {
                    continue;
                };
                if per_suffix[slot].is_some() {
                    continue;
                }
                let Some(attr) = caps.name("attr") else {
                    continue;
                };
                let value = caps
                    .name("dq")
                    .or_else(|| caps.name("sq"))
                    .or_else(|| caps.name("bare"))
                    .map_or("", |m| m.as_str());
                let start = tag.start() + attr.start();
                per_suffix[slot] = Some((start..tag.start() + attr.end(), value.to_string()));
            }
            for (slot, hit) in per_suffix.into_iter().enumerate() {
                if let Some((range, marker)) = hit {
                    found.push((range, self.suffixes[slot].clone(), marker));
                }
            }
        }
        found
    }

    /// Markup for one marker value. A property result replaces a scope
    /// result from the same marker.
    fn resolve(&mut self, raw: &str) -> String {
        let marker = parse_marker(raw);
        let scope = self.engine.load_marker(&marker);
        if marker.property.is_some() {
            self.engine.display(DisplayKind::Inline, false)
        } else {
            scope.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{find_edit, microdata, rdfa};

    fn microdata_rewriter() -> Rewriter<'static> {
        Rewriter::new("microdata").unwrap()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn semantic_names_are_case_insensitive() {
        assert_eq!(Rewriter::new("MICRODATA").unwrap().semantic(), Semantic::Microdata);
        assert_eq!(Rewriter::new("RDFa").unwrap().semantic(), Semantic::Rdfa);
    }

    #[test]
    fn unknown_semantic_is_error() {
        let err = Rewriter::new("json-ld").unwrap_err();
        assert!(matches!(err, RewriteError::UnknownSemantic(_)));
        assert!(err.to_string().contains("json-ld"));
    }

    #[test]
    fn set_semantic_switches_vocabulary() {
        let mut rewriter = microdata_rewriter();
        rewriter.set_semantic("rdfa").unwrap();
        assert_eq!(rewriter.semantic(), Semantic::Rdfa);
        assert!(rewriter.set_semantic("turtle").is_err());
        assert_eq!(rewriter.semantic(), Semantic::Rdfa);
    }

    #[test]
    fn default_suffix_is_sd() {
        assert_eq!(microdata_rewriter().suffixes(), ["sd"]);
    }

    #[test]
    fn suffixes_are_lowercased_and_deduplicated() {
        let mut rewriter = microdata_rewriter();
        rewriter.add_suffix("Custom").unwrap();
        rewriter.add_suffix("CUSTOM").unwrap();
        rewriter.add_suffix("sd").unwrap();
        assert_eq!(rewriter.suffixes(), ["sd", "custom"]);
    }

    #[test]
    fn empty_suffix_is_error() {
        let mut rewriter = microdata_rewriter();
        assert!(matches!(rewriter.add_suffix(""), Err(RewriteError::EmptySuffix)));
        assert!(matches!(rewriter.remove_suffix(" "), Err(RewriteError::EmptySuffix)));
    }

    #[test]
    fn remove_suffix_case_insensitive() {
        let mut rewriter = microdata_rewriter();
        rewriter.add_suffixes(["one", "two"]).unwrap();
        rewriter.remove_suffix("ONE").unwrap();
        rewriter.remove_suffix("missing").unwrap();
        assert_eq!(rewriter.suffixes(), ["sd", "two"]);
    }

    #[test]
    fn set_suffixes_replaces_list() {
        let mut rewriter = microdata_rewriter();
        rewriter.set_suffixes(["Custom", "other", "custom"]).unwrap();
        assert_eq!(rewriter.suffixes(), ["custom", "other"]);
        assert_eq!(rewriter.rewrite("<p data-sd='name'>"), "<p data-sd='name'>");
        assert!(rewriter.set_suffixes(["ok", ""]).is_err());
        assert_eq!(rewriter.suffixes(), ["custom", "other"]);
    }

    #[test]
    fn suffix_with_regex_metacharacters_is_literal() {
        let mut rewriter = microdata_rewriter();
        rewriter.add_suffix("a.b").unwrap();
        let html = "<p data-a.b='name'></p><p data-axb='name'></p>";
        assert_eq!(
            rewriter.rewrite(html),
            "<p itemprop='name'></p><p data-axb='name'></p>"
        );
    }

    // =========================================================================
    // Rewriting
    // =========================================================================

    #[test]
    fn type_and_property_marker() {
        let mut rewriter = microdata_rewriter();
        assert_eq!(
            rewriter.rewrite("<tag data-sd='Article.author'>"),
            "<tag itemprop='author'>"
        );
        assert_eq!(rewriter.engine().current_type(), "Article");
    }

    #[test]
    fn type_only_marker() {
        assert_eq!(
            microdata("<div data-sd=\"Article\">"),
            "<div itemscope itemtype='https://schema.org/Article'>"
        );
    }

    #[test]
    fn rdfa_type_marker() {
        assert_eq!(
            rdfa("<div data-sd=Article>"),
            "<div vocab='https://schema.org' typeof='Article'>"
        );
    }

    #[test]
    fn unknown_property_removes_attribute() {
        assert_eq!(
            microdata("<tag data-sd='Article.propertyDoesNotExist'>content</tag>"),
            "<tag >content</tag>"
        );
    }

    #[test]
    fn meta_tag_keeps_content_attribute() {
        let mut rewriter = microdata_rewriter();
        rewriter.rewrite("<article data-sd='Article'>");
        assert_eq!(
            rewriter.rewrite("<meta data-sd='datePublished' content='2014-01-01T00:00:00+00:00' />"),
            "<meta itemprop='datePublished' content='2014-01-01T00:00:00+00:00' />"
        );
    }

    #[test]
    fn current_type_carries_between_markers() {
        let mut rewriter = microdata_rewriter();
        let html = "<article data-sd='Article'><div data-sd='articleBody'></div></article>";
        assert_eq!(
            rewriter.rewrite(html),
            "<article itemscope itemtype='https://schema.org/Article'><div itemprop='articleBody'></div></article>"
        );
    }

    #[test]
    fn property_with_fallback_pair() {
        assert_eq!(
            microdata("<span data-sd='nope Person.name'>"),
            "<span itemscope itemtype='https://schema.org/Person' itemprop='name'>"
        );
    }

    #[test]
    fn fallback_property_uses_current_type() {
        let mut rewriter = microdata_rewriter();
        rewriter.rewrite("<article data-sd='Article'>");
        assert_eq!(
            rewriter.rewrite("<span data-sd='nope headline'>"),
            "<span itemscope itemtype='https://schema.org/Article' itemprop='headline'>"
        );
    }

    #[test]
    fn attribute_name_is_case_insensitive() {
        assert_eq!(microdata("<p DATA-SD='name'>"), "<p itemprop='name'>");
        assert_eq!(rdfa("<p Data-Sd='name'>"), "<p property='name'>");
    }

    #[test]
    fn unregistered_suffix_untouched() {
        let mut rewriter = microdata_rewriter();
        rewriter.add_suffix("custom").unwrap();
        let html = "<p data-sd='name' data-custom='url' data-unregistered='name'>";
        assert_eq!(
            rewriter.rewrite(html),
            "<p itemprop='name' itemprop='url' data-unregistered='name'>"
        );
    }

    #[test]
    fn only_first_attribute_per_suffix() {
        let mut rewriter = microdata_rewriter();
        assert_eq!(
            rewriter.rewrite("<p data-sd='name' data-sd='url'>"),
            "<p itemprop='name' data-sd='url'>"
        );
    }

    #[test]
    fn suffixes_processed_in_configured_order() {
        let mut rewriter = microdata_rewriter();
        rewriter.add_suffix("type").unwrap();
        // The `sd` marker is resolved first, before `type` switches to Article.
        let outcome = rewriter.rewrite_document("<div data-type='Article' data-sd='articleBody'>");
        assert_eq!(outcome.html, "<div itemscope itemtype='https://schema.org/Article' >");
        assert_eq!(outcome.edits[0].suffix, "sd");
        assert_eq!(outcome.edits[1].suffix, "type");
        assert_eq!(find_edit(&outcome, "articleBody").replacement, "");
        assert_eq!(outcome.unresolved(), 1);
    }

    #[test]
    fn identical_markers_rewrite_in_place() {
        let mut rewriter = microdata_rewriter();
        let html = "<a data-sd='Person'><b data-sd='name'></b><a data-sd='Place'><b data-sd='name'></b>";
        assert_eq!(
            rewriter.rewrite(html),
            "<a itemscope itemtype='https://schema.org/Person'><b itemprop='name'></b>\
             <a itemscope itemtype='https://schema.org/Place'><b itemprop='name'></b>"
        );
    }

    #[test]
    fn similar_attribute_names_are_not_markers() {
        let mut rewriter = microdata_rewriter();
        let html = "<p data-sdx='name' data-sd-extra='name'>sd='name'</p>";
        assert_eq!(rewriter.rewrite(html), html);
    }

    #[test]
    fn text_outside_tags_is_untouched() {
        let mut rewriter = microdata_rewriter();
        let html = "<!-- data-sd='name' --><p>a data-sd='name' b</p>";
        assert_eq!(rewriter.rewrite(html), html);
    }

    #[test]
    fn no_suffixes_means_no_edits() {
        let mut rewriter = microdata_rewriter();
        rewriter.remove_suffix("sd").unwrap();
        let outcome = rewriter.rewrite_document("<p data-sd='name'>");
        assert_eq!(outcome.html, "<p data-sd='name'>");
        assert!(outcome.edits.is_empty());
    }

    #[test]
    fn outcome_records_edits() {
        let mut rewriter = microdata_rewriter();
        let outcome = rewriter.rewrite_document("<p data-sd='name'>");
        assert_eq!(
            outcome.edits,
            vec![MarkerEdit {
                range: 3..17,
                suffix: "sd".to_string(),
                marker: "name".to_string(),
                replacement: "itemprop='name'".to_string(),
            }]
        );
        assert_eq!(outcome.unresolved(), 0);
    }
}
