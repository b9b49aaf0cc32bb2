//! The schema.org type hierarchy.
//!
//! A [`TypeCatalog`] maps every type name to its parent and to the properties
//! it declares. Property lookups walk the ancestor chain, so a property
//! declared on `CreativeWork` is available on `Article`, `NewsArticle` and
//! every other descendant.
//!
//! ## Data Format
//!
//! Catalogs are built from a JSON object keyed by type name. Each property
//! lists its schema.org expected types in order:
//!
//! ```json
//! {
//!   "Thing":   { "properties": { "name": ["Text"], "url": ["URL"] } },
//!   "Article": { "extends": "CreativeWork",
//!                "properties": { "articleBody": ["Text"] } },
//!   "NewsArticle": { "extends": "Article" }
//! }
//! ```
//!
//! The first expected type decides how a property is displayed:
//!
//! | First expected type | [`DisplayType`] |
//! |---------------------|-----------------|
//! | `Date`, `DateTime`, `Time`, `Duration` | `Meta` (machine-readable value) |
//! | `Text`, `URL`, `Boolean`, `Number`, `Integer`, `Float` | `Normal` |
//! | any other type name | `Nested` (opens a child scope) |
//!
//! The bundled table ([`TypeCatalog::schema_org`]) is embedded in the binary
//! and parsed once per process.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Every chain terminates here; unknown types resolve to it.
pub const ROOT_TYPE: &str = "Thing";

const MACHINE_TYPES: &[&str] = &["Date", "DateTime", "Time", "Duration"];
const SCALAR_TYPES: &[&str] = &["Text", "URL", "Boolean", "Number", "Integer", "Float"];

static SCHEMA_ORG: LazyLock<TypeCatalog> = LazyLock::new(|| {
    TypeCatalog::from_json(include_str!("../data/schema-org.json"))
        .expect("bundled schema.org table must be valid")
});

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Type table has no root type 'Thing'")]
    MissingRoot,
    #[error("Root type 'Thing' must not extend '{0}'")]
    RootHasParent(String),
    #[error("Type '{child}' extends unknown type '{parent}'")]
    UnknownParent { child: String, parent: String },
    #[error("Type '{0}' has no parent and is not the root type")]
    Orphan(String),
    #[error("Ancestor chain of '{0}' is cyclic")]
    Cycle(String),
}

/// How a property's value is presented.
///
/// Ordered by precedence: when a property is declared more than once along a
/// chain, the highest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DisplayType {
    /// A plain attribute, or a `<span>` around the human content.
    Normal,
    /// The property value is itself a typed item with its own scope.
    Nested,
    /// The value needs a machine-readable form in a `<meta>` element.
    Meta,
}

impl DisplayType {
    fn classify(expected_types: &[String]) -> Self {
        match expected_types.first().map(String::as_str) {
            Some(t) if MACHINE_TYPES.contains(&t) => DisplayType::Meta,
            Some(t) if SCALAR_TYPES.contains(&t) => DisplayType::Normal,
            Some(_) => DisplayType::Nested,
            None => DisplayType::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayType::Normal => "normal",
            DisplayType::Nested => "nested",
            DisplayType::Meta => "meta",
        }
    }
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property as declared on one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    /// schema.org expected types, in declaration order.
    pub expected_types: Vec<String>,
    /// Classification derived from the first expected type.
    pub display: DisplayType,
}

/// One type of the hierarchy with its own (non-inherited) properties.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub name: String,
    pub parent: Option<String>,
    pub properties: BTreeMap<String, PropertyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, Vec<String>>,
}

/// Immutable type table with inheritance-aware lookups.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: BTreeMap<String, TypeEntry>,
}

impl TypeCatalog {
    /// The bundled schema.org table, parsed on first use.
    pub fn schema_org() -> &'static TypeCatalog {
        &SCHEMA_ORG
    }

    /// Build and validate a catalog from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, RawEntry> = serde_json::from_str(json)?;
        let types = raw
            .into_iter()
            .map(|(name, entry)| {
                let properties = entry
                    .properties
                    .into_iter()
                    .map(|(property, expected_types)| {
                        let display = DisplayType::classify(&expected_types);
                        (
                            property,
                            PropertyEntry {
                                expected_types,
                                display,
                            },
                        )
                    })
                    .collect();
                let entry = TypeEntry {
                    name: name.clone(),
                    parent: entry.extends,
                    properties,
                };
                (name, entry)
            })
            .collect();
        let catalog = Self { types };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check that the table forms a single tree rooted at `Thing`.
    fn validate(&self) -> Result<(), CatalogError> {
        let root = self.types.get(ROOT_TYPE).ok_or(CatalogError::MissingRoot)?;
        if let Some(parent) = &root.parent {
            return Err(CatalogError::RootHasParent(parent.clone()));
        }

        for entry in self.types.values() {
            match &entry.parent {
                Some(parent) if !self.types.contains_key(parent) => {
                    return Err(CatalogError::UnknownParent {
                        child: entry.name.clone(),
                        parent: parent.clone(),
                    });
                }
                None if entry.name != ROOT_TYPE => {
                    return Err(CatalogError::Orphan(entry.name.clone()));
                }
                _ => {}
            }

            // A chain can't be longer than the table without repeating a type.
            let mut steps = 0;
            let mut current = entry.parent.as_deref();
            while let Some(name) = current {
                steps += 1;
                if steps > self.types.len() {
                    return Err(CatalogError::Cycle(entry.name.clone()));
                }
                current = self.types.get(name).and_then(|e| e.parent.as_deref());
            }
        }
        Ok(())
    }

    /// Number of types in the table.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn is_type_available(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// All type names, sorted.
    pub fn available_types(&self) -> BTreeSet<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    pub fn entry(&self, type_name: &str) -> Option<&TypeEntry> {
        self.types.get(type_name)
    }

    /// The type itself when known, `Thing` otherwise.
    pub fn sanitize_type<'a>(&'a self, type_name: &'a str) -> &'a str {
        if self.is_type_available(type_name) {
            type_name
        } else {
            ROOT_TYPE
        }
    }

    /// The chain from `type_name` up to `Thing`, inclusive.
    ///
    /// Empty for unknown types.
    pub fn ancestors(&self, type_name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.types.get(type_name);
        while let Some(entry) = current {
            chain.push(entry.name.as_str());
            current = entry.parent.as_deref().and_then(|p| self.types.get(p));
        }
        chain
    }

    /// Every declaration of `property` along the chain, nearest first.
    fn declarations(&self, type_name: &str, property: &str) -> Vec<&PropertyEntry> {
        self.ancestors(type_name)
            .into_iter()
            .filter_map(|name| self.types.get(name)?.properties.get(property))
            .collect()
    }

    /// Whether `property` is declared on `type_name` or any ancestor.
    ///
    /// Unknown types have no properties.
    pub fn is_property_in_type(&self, type_name: &str, property: &str) -> bool {
        !self.declarations(type_name, property).is_empty()
    }

    /// Classify a property of a type. `Meta` beats `Nested` beats `Normal`.
    pub fn expected_display_type(&self, type_name: &str, property: &str) -> DisplayType {
        self.declarations(type_name, property)
            .into_iter()
            .map(|p| p.display)
            .max()
            .unwrap_or(DisplayType::Normal)
    }

    /// Expected types of the nearest declaration of `property`.
    pub fn expected_types(&self, type_name: &str, property: &str) -> &[String] {
        self.declarations(type_name, property)
            .into_iter()
            .next()
            .map(|p| p.expected_types.as_slice())
            .unwrap_or(&[])
    }

    /// Properties declared directly on `type_name`, sorted by name.
    pub fn properties_of(&self, type_name: &str) -> impl Iterator<Item = (&str, &PropertyEntry)> {
        self.types
            .get(type_name)
            .into_iter()
            .flat_map(|entry| entry.properties.iter().map(|(k, v)| (k.as_str(), v)))
    }
}
