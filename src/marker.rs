//! Terse marker strings.
//!
//! A marker is the value of a `data-sd` attribute: a primary segment and an
//! optional fallback segment, separated by a space.
//!
//! ```text
//! "Article"                          → type Article
//! "Article.author"                   → type Article, property author
//! "author Person.name"               → property author, fallback Person.name
//! "headline about"                   → property headline, fallback property about
//! ```
//!
//! Within a segment, a leading capital marks a type name. Parsing never
//! fails; anything unrecognised is simply absent from the result.

/// The parts of one marker. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marker {
    pub type_name: Option<String>,
    pub property: Option<String>,
    pub fallback_type: Option<String>,
    pub fallback_property: Option<String>,
}

impl Marker {
    pub fn is_empty(&self) -> bool {
        *self == Marker::default()
    }

    /// Whether the marker carries a fallback segment.
    pub fn has_fallback(&self) -> bool {
        self.fallback_type.is_some() || self.fallback_property.is_some()
    }
}

// ASCII only: `Éclair` is a property, not a type.
fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Split one `Type.property` segment.
///
/// A lowercase second token is always the property, even when the first
/// token already named one. A segment whose first token is empty yields
/// nothing, so `.Type.property` carries neither part.
fn parse_segment(segment: &str) -> (Option<String>, Option<String>) {
    let mut tokens = segment.split('.');
    let first = tokens.next().unwrap_or("");
    if first.is_empty() {
        return (None, None);
    }
    let second = tokens
        .next()
        .filter(|t| !t.is_empty() && !starts_uppercase(t))
        .map(str::to_string);

    if starts_uppercase(first) {
        (Some(first.to_string()), second)
    } else {
        (None, second.or_else(|| Some(first.to_string())))
    }
}

/// Parse a raw marker. Pieces after the second space-separated segment are
/// ignored.
pub fn parse_marker(raw: &str) -> Marker {
    let mut segments = raw.trim().split(' ');
    let (type_name, property) = segments.next().map(parse_segment).unwrap_or_default();
    let (fallback_type, fallback_property) = segments.next().map(parse_segment).unwrap_or_default();

    Marker {
        type_name,
        property,
        fallback_type,
        fallback_property,
    }
}
