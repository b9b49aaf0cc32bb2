//! Shared test utilities.
//!
//! Provides a small on-disk site fixture, one-shot rewrite helpers, and
//! catalog lookups that panic with a useful message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_site(tmp.path());
//!
//! assert_eq!(microdata("<p data-sd='name'>"), "<p itemprop='name'>");
//! let article = find_type(TypeCatalog::schema_org(), "Article");
//! assert_eq!(article.parent.as_deref(), Some("CreativeWork"));
//! ```

use std::fs;
use std::path::Path;

use crate::catalog::{TypeCatalog, TypeEntry};
use crate::rewrite::{MarkerEdit, RewriteOutcome, Rewriter};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a small site under `root`:
///
/// ```text
/// root/
/// ├── blog/post.htm   # 2 markers
/// ├── index.html      # 3 markers, one unresolvable
/// ├── plain.html      # no markers
/// └── style.css       # not an HTML extension
/// ```
pub fn write_site(root: &Path) {
    fs::create_dir_all(root.join("blog")).unwrap();
    fs::write(
        root.join("index.html"),
        "<html><body>\n\
         <article data-sd='Article'>\n\
         <h1 data-sd='headline'>Hello</h1>\n\
         <p data-sd='nope'>Body</p>\n\
         </article>\n\
         </body></html>\n",
    )
    .unwrap();
    fs::write(
        root.join("blog/post.htm"),
        "<div data-sd=\"Article\"><span data-sd=\"author\">Jane</span></div>\n",
    )
    .unwrap();
    fs::write(root.join("plain.html"), "<p>No markers here</p>\n").unwrap();
    fs::write(root.join("style.css"), "/* data-sd='name' */\n").unwrap();
}

// =========================================================================
// One-shot rewriting
// =========================================================================

/// Rewrite `html` with a fresh Microdata rewriter.
pub fn microdata(html: &str) -> String {
    Rewriter::new("microdata").unwrap().rewrite(html)
}

/// Rewrite `html` with a fresh RDFa rewriter.
pub fn rdfa(html: &str) -> String {
    Rewriter::new("rdfa").unwrap().rewrite(html)
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a type entry. Panics listing similarly-prefixed types if not found.
pub fn find_type<'a>(catalog: &'a TypeCatalog, name: &str) -> &'a TypeEntry {
    catalog.entry(name).unwrap_or_else(|| {
        let prefix: String = name.chars().take(3).collect();
        let near: Vec<&str> = catalog
            .available_types()
            .into_iter()
            .filter(|t| t.starts_with(&prefix))
            .collect();
        panic!("type '{name}' not found. Similar: {near:?}")
    })
}

/// Find the edit produced by a marker value. Panics if none matches.
pub fn find_edit<'a>(outcome: &'a RewriteOutcome, marker: &str) -> &'a MarkerEdit {
    outcome
        .edits
        .iter()
        .find(|e| e.marker == marker)
        .unwrap_or_else(|| {
            let markers: Vec<&str> = outcome.edits.iter().map(|e| e.marker.as_str()).collect();
            panic!("no edit for marker '{marker}'. Available: {markers:?}")
        })
}
