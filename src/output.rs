//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Site
//!
//! ```text
//! 001 blog/post.htm (2 markers)
//! 002 index.html (3 markers, 1 unresolved)
//! 003 plain.html (no markers)
//!
//! Skipped
//!     bad.html (not UTF-8)
//!
//! Rewrote 5 markers in 2 of 3 files → out/
//! ```
//!
//! ## Resolve
//!
//! ```text
//! Marker "Article.author Person.name"
//!     Type: Article
//!     Property: author
//!     Fallback: Person.name
//!
//! microdata, current type Article
//!     Scope: itemscope itemtype='https://schema.org/Article'
//!     Attribute: itemprop='author'
//!     Auto: itemprop='author' itemscope itemtype='https://schema.org/Person' itemprop='name'
//! ```
//!
//! ## Types
//!
//! ```text
//! NewsArticle → Article → CreativeWork → Thing
//!
//! NewsArticle
//!     dateline (normal): Text
//! Article
//!     articleBody (normal): Text
//! ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::BatchReport;
use crate::catalog::TypeCatalog;
use crate::engine::Resolution;
use crate::marker::Marker;
use crate::vocabulary::Semantic;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Site output
// ============================================================================

/// Format the summary of a `site` run.
pub fn format_site_output(report: &BatchReport, destination: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, file) in report.files.iter().enumerate() {
        let detail = match (file.markers, file.unresolved) {
            (0, _) => "no markers".to_string(),
            (n, 0) => plural(n, "marker", "markers"),
            (n, u) => format!("{}, {} unresolved", plural(n, "marker", "markers"), u),
        };
        lines.push(format!("{} {} ({})", format_index(i + 1), file.path.display(), detail));
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for path in &report.skipped {
            lines.push(format!("{}{} (not UTF-8)", indent(1), path.display()));
        }
    }

    lines.push(String::new());
    let summary = format!(
        "Rewrote {} in {} of {}",
        plural(report.total_markers(), "marker", "markers"),
        report.changed_files(),
        plural(report.files.len(), "file", "files"),
    );
    match destination {
        Some(out) => lines.push(format!("{summary} → {}/", out.display())),
        None => lines.push(summary),
    }

    lines
}

/// Print site output to stdout.
pub fn print_site_output(report: &BatchReport, destination: Option<&Path>) {
    for line in format_site_output(report, destination) {
        println!("{}", line);
    }
}

// ============================================================================
// Resolve output
// ============================================================================

/// Format a parsed marker and the fragments it renders to.
pub fn format_resolve_output(
    raw: &str,
    marker: &Marker,
    semantic: Semantic,
    resolution: &Resolution,
) -> Vec<String> {
    let mut lines = vec![format!("Marker \"{raw}\"")];

    if marker.is_empty() {
        lines.push(format!("{}(nothing recognised)", indent(1)));
    }
    if let Some(t) = &marker.type_name {
        lines.push(format!("{}Type: {t}", indent(1)));
    }
    if let Some(p) = &marker.property {
        lines.push(format!("{}Property: {p}", indent(1)));
    }
    match (&marker.fallback_type, &marker.fallback_property) {
        (Some(t), Some(p)) => lines.push(format!("{}Fallback: {t}.{p}", indent(1))),
        (Some(t), None) => lines.push(format!("{}Fallback: {t}", indent(1))),
        (None, Some(p)) => lines.push(format!("{}Fallback: {p}", indent(1))),
        (None, None) => {}
    }

    lines.push(String::new());
    lines.push(format!("{semantic}, current type {}", resolution.current_type));
    let fragments = [
        ("Scope", &resolution.scope),
        ("Attribute", &resolution.inline),
        ("Auto", &resolution.auto),
    ];
    for (label, fragment) in fragments {
        if let Some(fragment) = fragment {
            let shown = if fragment.is_empty() { "(empty)" } else { fragment.as_str() };
            lines.push(format!("{}{label}: {shown}", indent(1)));
        }
    }

    lines
}

/// Print resolve output to stdout.
pub fn print_resolve_output(raw: &str, marker: &Marker, semantic: Semantic, resolution: &Resolution) {
    for line in format_resolve_output(raw, marker, semantic, resolution) {
        println!("{}", line);
    }
}

// ============================================================================
// Types output
// ============================================================================

/// Every type name, sorted, followed by a count.
pub fn format_types_list(catalog: &TypeCatalog) -> Vec<String> {
    let mut lines: Vec<String> = catalog
        .available_types()
        .into_iter()
        .map(str::to_string)
        .collect();
    lines.push(String::new());
    lines.push(plural(catalog.len(), "type", "types"));
    lines
}

/// A type's ancestor chain and the properties each link declares.
pub fn format_type_detail(catalog: &TypeCatalog, type_name: &str) -> Vec<String> {
    let chain = catalog.ancestors(type_name);
    if chain.is_empty() {
        return vec![format!("Unknown type '{type_name}' (resolves to Thing)")];
    }

    let mut lines = vec![chain.join(" → ")];
    for link in &chain {
        lines.push(String::new());
        lines.push(link.to_string());
        let mut any = false;
        for (name, entry) in catalog.properties_of(link) {
            any = true;
            lines.push(format!(
                "{}{name} ({}): {}",
                indent(1),
                entry.display,
                entry.expected_types.join(", ")
            ));
        }
        if !any {
            lines.push(format!("{}(no own properties)", indent(1)));
        }
    }
    lines
}

/// Print the type list or one type's detail to stdout.
pub fn print_types_output(catalog: &TypeCatalog, type_name: Option<&str>) {
    let lines = match type_name {
        Some(t) => format_type_detail(catalog, t),
        None => format_types_list(catalog),
    };
    for line in lines {
        println!("{}", line);
    }
}
