//! Microdata and RDFa Lite attribute vocabularies.
//!
//! Both semantics describe the same thing (a typed scope holding named
//! properties) with different attribute names:
//!
//! | Concept  | Microdata | RDFa Lite |
//! |----------|-----------|-----------|
//! | scope    | `itemscope itemtype='https://schema.org/Article'` | `vocab='https://schema.org' typeof='Article'` |
//! | property | `itemprop='name'` | `property='name'` |
//!
//! The [`Vocabulary`] trait holds those strings; the tag helpers built on top
//! of it ([`Vocabulary::html_tag`] and friends) are shared.

use crate::catalog::TypeCatalog;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SCHEMA_ORG_URL: &str = "https://schema.org";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown semantic '{0}' (expected 'microdata' or 'rdfa')")]
pub struct UnknownSemantic(pub String);

/// Which markup flavour to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Semantic {
    #[default]
    Microdata,
    Rdfa,
}

impl Semantic {
    pub const ALL: [Semantic; 2] = [Semantic::Microdata, Semantic::Rdfa];

    pub fn name(self) -> &'static str {
        match self {
            Semantic::Microdata => "microdata",
            Semantic::Rdfa => "rdfa",
        }
    }

    pub fn vocabulary(self) -> &'static dyn Vocabulary {
        match self {
            Semantic::Microdata => &Microdata,
            Semantic::Rdfa => &Rdfa,
        }
    }
}

impl FromStr for Semantic {
    type Err = UnknownSemantic;

    /// Case-insensitive: `"RDFa"`, `"rdfa"` and `"RDFA"` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Semantic::ALL
            .into_iter()
            .find(|semantic| semantic.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSemantic(s.to_string()))
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The attribute strings of one semantic, plus tag helpers built from them.
///
/// Scope helpers resolve unknown type names to `Thing`: [`html_scope`] and
/// the tag helpers against the bundled schema.org table, [`html_scope_in`]
/// against any catalog.
///
/// [`html_scope`]: Vocabulary::html_scope
/// [`html_scope_in`]: Vocabulary::html_scope_in
pub trait Vocabulary: fmt::Debug + Send + Sync {
    fn semantic(&self) -> Semantic;

    /// Scope attributes for `type_name`, used verbatim.
    fn scope_attributes(&self, type_name: &str) -> String;

    /// Scope attributes declaring an item of `type_name`.
    fn html_scope(&self, type_name: &str) -> String {
        self.html_scope_in(TypeCatalog::schema_org(), type_name)
    }

    fn html_scope_in(&self, catalog: &TypeCatalog, type_name: &str) -> String {
        self.scope_attributes(catalog.sanitize_type(type_name))
    }

    /// Attribute naming a property of the enclosing item.
    fn html_property(&self, property: &str) -> String;

    /// Whether `fragment` is already a rendered scope.
    fn is_scope_fragment(&self, fragment: &str) -> bool;

    /// Whether `fragment` is already a rendered property attribute.
    fn is_property_fragment(&self, fragment: &str) -> bool;

    /// Render `<tag {scope} {property}>content</tag>`.
    ///
    /// `property` and `scope` may be bare names or already-rendered
    /// fragments; bare names get the vocabulary's attribute. `invert` puts
    /// the property before the scope. A `meta` tag is self-closing and
    /// carries `content` in its `content` attribute.
    fn html_tag(&self, tag: &str, content: &str, property: &str, scope: &str, invert: bool) -> String {
        let property = if property.is_empty() || self.is_property_fragment(property) {
            property.to_string()
        } else {
            self.html_property(property)
        };
        let scope = if scope.is_empty() || self.is_scope_fragment(scope) {
            scope.to_string()
        } else {
            self.html_scope(scope)
        };

        let pair = if invert { [property, scope] } else { [scope, property] };
        let joined = pair.join(" ");
        let attributes = match joined.trim() {
            "" => String::new(),
            trimmed => format!(" {trimmed}"),
        };

        if tag == "meta" {
            format!("<meta{attributes} content='{content}'/>")
        } else {
            format!("<{tag}{attributes}>{content}</{tag}>")
        }
    }

    fn html_span(&self, content: &str, property: &str, scope: &str, invert: bool) -> String {
        self.html_tag("span", content, property, scope, invert)
    }

    fn html_div(&self, content: &str, property: &str, scope: &str, invert: bool) -> String {
        self.html_tag("div", content, property, scope, invert)
    }

    fn html_meta(&self, content: &str, property: &str, scope: &str, invert: bool) -> String {
        self.html_tag("meta", content, property, scope, invert)
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// `itemscope` / `itemtype` / `itemprop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Microdata;

impl Vocabulary for Microdata {
    fn semantic(&self) -> Semantic {
        Semantic::Microdata
    }

    fn scope_attributes(&self, type_name: &str) -> String {
        format!("itemscope itemtype='{SCHEMA_ORG_URL}/{type_name}'")
    }

    fn html_property(&self, property: &str) -> String {
        format!("itemprop='{property}'")
    }

    fn is_scope_fragment(&self, fragment: &str) -> bool {
        starts_with_ignore_case(fragment, "itemscope")
    }

    fn is_property_fragment(&self, fragment: &str) -> bool {
        starts_with_ignore_case(fragment, "itemprop=")
    }
}

/// `vocab` / `typeof` / `property`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rdfa;

impl Vocabulary for Rdfa {
    fn semantic(&self) -> Semantic {
        Semantic::Rdfa
    }

    fn scope_attributes(&self, type_name: &str) -> String {
        format!("vocab='{SCHEMA_ORG_URL}' typeof='{type_name}'")
    }

    fn html_property(&self, property: &str) -> String {
        format!("property='{property}'")
    }

    fn is_scope_fragment(&self, fragment: &str) -> bool {
        starts_with_ignore_case(fragment, "vocab=") || starts_with_ignore_case(fragment, "typeof=")
    }

    // `propertyID` is a real property name, so the `=` matters here.
    fn is_property_fragment(&self, fragment: &str) -> bool {
        starts_with_ignore_case(fragment, "property=")
    }
}
