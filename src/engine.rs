//! Structured-markup rendering.
//!
//! A [`MarkupEngine`] remembers the current item type and collects the pieces
//! of one annotation (property, human content, machine content, fallback)
//! through chained setters. [`MarkupEngine::display`] hands them to the pure
//! [`render`] function and resets them:
//!
//! ```text
//! engine.set_type("Article");
//! engine.property("datePublished").content_with_machine("1 Jan 2011", "2011-01-01");
//! engine.display(DisplayKind::Auto, false)
//!   → <meta itemprop='datePublished' content='2011-01-01'/>1 Jan 2011
//! ```
//!
//! ## Resolution Order
//!
//! 1. The property, if it belongs to the current type.
//! 2. The fallback property, scoped to the fallback type.
//! 3. The fallback type's scope alone.
//! 4. Nothing: the plain content comes back unchanged.
//!
//! Unknown types resolve to `Thing` and unknown properties produce no
//! markup. Rendering never fails.
//!
//! ## Automatic Layout
//!
//! With [`DisplayKind::Auto`] the property's [`DisplayType`] picks the layout:
//!
//! | DisplayType | with content | without content |
//! |-------------|--------------|-----------------|
//! | `Normal` | `<span itemprop='p'>content</span>` | `itemprop='p'` |
//! | `Nested` | `<span itemprop='p' itemscope itemtype='…/T'>content</span>` | `itemprop='p' itemscope itemtype='…/T'` |
//! | `Meta` | `<meta itemprop='p' content='machine'/>content` | `itemprop='p'` |

use crate::catalog::{DisplayType, ROOT_TYPE, TypeCatalog};
use crate::marker::Marker;
use crate::vocabulary::{Semantic, Vocabulary};

/// Requested output shape for [`MarkupEngine::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayKind {
    /// Layout chosen from the property's [`DisplayType`].
    #[default]
    Auto,
    /// Attribute text only, never wrapped in an element.
    Inline,
    /// Content wrapped in a `<span>`.
    Span,
    /// Content wrapped in a `<div>`.
    Div,
    /// A self-closing `<meta>` carrying the machine content.
    Meta,
}

/// Engine state between two `display` calls.
///
/// `current_type` and `enabled` persist; the other fields are consumed by
/// every `display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    pub current_type: String,
    pub property: Option<String>,
    pub content: Option<String>,
    pub machine_content: Option<String>,
    pub fallback_type: Option<String>,
    pub fallback_property: Option<String>,
    pub enabled: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            current_type: ROOT_TYPE.to_string(),
            property: None,
            content: None,
            machine_content: None,
            fallback_type: None,
            fallback_property: None,
            enabled: true,
        }
    }
}

impl RenderState {
    /// Move the transient fields into a request, leaving them unset.
    fn take_request(&mut self, kind: DisplayKind, invert: bool) -> RenderRequest {
        RenderRequest {
            current_type: self.current_type.clone(),
            property: self.property.take(),
            content: self.content.take(),
            machine_content: self.machine_content.take(),
            fallback_type: self.fallback_type.take(),
            fallback_property: self.fallback_property.take(),
            kind,
            invert,
        }
    }

    /// Whether any transient field is set.
    pub fn has_pending(&self) -> bool {
        self.property.is_some()
            || self.content.is_some()
            || self.machine_content.is_some()
            || self.fallback_type.is_some()
            || self.fallback_property.is_some()
    }
}

/// Everything one annotation is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderRequest {
    pub current_type: String,
    pub property: Option<String>,
    pub content: Option<String>,
    pub machine_content: Option<String>,
    pub fallback_type: Option<String>,
    pub fallback_property: Option<String>,
    pub kind: DisplayKind,
    /// Put the property before the scope where both share an element.
    pub invert: bool,
}

impl RenderRequest {
    pub fn new(current_type: &str) -> Self {
        Self {
            current_type: current_type.to_string(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.property = Some(property.to_string());
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn with_machine_content(mut self, machine: &str) -> Self {
        self.machine_content = Some(machine.to_string());
        self
    }

    pub fn with_fallback(mut self, type_name: &str, property: Option<&str>) -> Self {
        self.fallback_type = Some(type_name.to_string());
        self.fallback_property = property.map(str::to_string);
        self
    }

    pub fn with_kind(mut self, kind: DisplayKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

/// Render one annotation. Pure: the same request always gives the same text.
///
/// Types are sanitized and properties checked against `catalog` here, so a
/// hand-built request gets the same treatment as one from an engine.
pub fn render(vocabulary: &dyn Vocabulary, catalog: &TypeCatalog, request: &RenderRequest) -> String {
    let current_type = catalog.sanitize_type(&request.current_type);

    if let Some(property) = request
        .property
        .as_deref()
        .filter(|p| catalog.is_property_in_type(current_type, p))
    {
        return render_property(vocabulary, catalog, request, current_type, property);
    }

    let fallback_type = request
        .fallback_type
        .as_deref()
        .map(|t| catalog.sanitize_type(t));
    let fallback_scope_type = fallback_type.unwrap_or(current_type);
    let fallback_property = request
        .fallback_property
        .as_deref()
        .filter(|p| catalog.is_property_in_type(fallback_scope_type, p));

    match (fallback_type, fallback_property) {
        (_, Some(property)) => {
            render_fallback(vocabulary, catalog, request, fallback_scope_type, property)
        }
        (Some(type_name), None) => vocabulary.html_scope_in(catalog, type_name),
        // A machine element without a property carries nothing.
        (None, None) if request.kind == DisplayKind::Meta => String::new(),
        (None, None) => request.content.clone().unwrap_or_default(),
    }
}

/// Join two attribute fragments, swapping them when `swap` is set.
fn pair(first: String, second: String, swap: bool) -> String {
    if swap {
        format!("{second} {first}")
    } else {
        format!("{first} {second}")
    }
}

fn render_property(
    vocabulary: &dyn Vocabulary,
    catalog: &TypeCatalog,
    request: &RenderRequest,
    current_type: &str,
    property: &str,
) -> String {
    let content = request.content.as_deref();
    let machine = request.machine_content.as_deref().or(content);
    let attribute = vocabulary.html_property(property);

    match request.kind {
        DisplayKind::Inline => attribute,
        DisplayKind::Span => vocabulary.html_span(content.unwrap_or(""), &attribute, "", false),
        DisplayKind::Div => vocabulary.html_div(content.unwrap_or(""), &attribute, "", false),
        DisplayKind::Meta => vocabulary.html_meta(machine.unwrap_or(""), &attribute, "", false),
        DisplayKind::Auto => match catalog.expected_display_type(current_type, property) {
            DisplayType::Nested => {
                render_nested(vocabulary, catalog, request, current_type, property, attribute)
            }
            DisplayType::Meta => match content {
                Some(human) => {
                    let meta = vocabulary.html_meta(machine.unwrap_or(human), &attribute, "", false);
                    format!("{meta}{human}")
                }
                None => attribute,
            },
            DisplayType::Normal => match content {
                Some(human) => vocabulary.html_span(human, &attribute, "", false),
                None => attribute,
            },
        },
    }
}

/// A property whose value is itself an item: the property attribute plus the
/// child scope. The child type is the fallback type when the property accepts
/// it (with the fallback property inside), otherwise the first expected type.
fn render_nested(
    vocabulary: &dyn Vocabulary,
    catalog: &TypeCatalog,
    request: &RenderRequest,
    current_type: &str,
    property: &str,
    attribute: String,
) -> String {
    let expected = catalog.expected_types(current_type, property);
    let fallback_type = request
        .fallback_type
        .as_deref()
        .map(|t| catalog.sanitize_type(t))
        .filter(|t| expected.iter().any(|e| e == t));

    let (nested_type, nested_property) = match fallback_type {
        Some(type_name) => (
            type_name,
            request
                .fallback_property
                .as_deref()
                .filter(|p| catalog.is_property_in_type(type_name, p)),
        ),
        None => (
            catalog.sanitize_type(expected.first().map(String::as_str).unwrap_or(ROOT_TYPE)),
            None,
        ),
    };
    let scope = vocabulary.html_scope_in(catalog, nested_type);

    // Property-first unless inverted: the property belongs to the outer item.
    match request.content.as_deref() {
        Some(human) => {
            let inner = match nested_property {
                Some(p) => vocabulary.html_span(human, p, "", false),
                None => human.to_string(),
            };
            vocabulary.html_span(&inner, &attribute, &scope, !request.invert)
        }
        None => {
            let head = pair(attribute, scope, request.invert);
            match nested_property {
                Some(p) => format!("{head} {}", vocabulary.html_property(p)),
                None => head,
            }
        }
    }
}

/// The fallback pair, rendered inside the fallback type's own scope.
fn render_fallback(
    vocabulary: &dyn Vocabulary,
    catalog: &TypeCatalog,
    request: &RenderRequest,
    type_name: &str,
    property: &str,
) -> String {
    let content = request.content.as_deref();
    let machine = request.machine_content.as_deref().or(content);
    let attribute = vocabulary.html_property(property);
    let scope = vocabulary.html_scope_in(catalog, type_name);
    let invert = request.invert;

    match request.kind {
        DisplayKind::Inline => pair(scope, attribute, invert),
        DisplayKind::Span => vocabulary.html_span(content.unwrap_or(""), &attribute, &scope, invert),
        DisplayKind::Div => vocabulary.html_div(content.unwrap_or(""), &attribute, &scope, invert),
        DisplayKind::Meta => vocabulary.html_meta(machine.unwrap_or(""), &attribute, &scope, invert),
        DisplayKind::Auto => match (catalog.expected_display_type(type_name, property), content) {
            (DisplayType::Meta, Some(human)) => {
                vocabulary.html_meta(machine.unwrap_or(human), &attribute, &scope, invert)
            }
            (_, Some(human)) => {
                let inner = vocabulary.html_span(human, &attribute, "", false);
                vocabulary.html_span(&inner, "", &scope, false)
            }
            (_, None) => pair(scope, attribute, invert),
        },
    }
}

/// Fragments produced for one marker by [`MarkupEngine::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Current type after the marker was applied.
    pub current_type: String,
    pub scope: Option<String>,
    pub inline: Option<String>,
    pub auto: Option<String>,
}

/// Stateful front end over [`render`] for one vocabulary and catalog.
///
/// Setters take `&mut self` and return it for chaining; one caller owns one
/// engine.
#[derive(Debug, Clone)]
pub struct MarkupEngine<'c> {
    catalog: &'c TypeCatalog,
    vocabulary: &'static dyn Vocabulary,
    state: RenderState,
}

impl MarkupEngine<'static> {
    /// Engine over the bundled schema.org table.
    pub fn new(semantic: Semantic) -> Self {
        Self::with_catalog(semantic, TypeCatalog::schema_org())
    }
}

impl Default for MarkupEngine<'static> {
    fn default() -> Self {
        Self::new(Semantic::default())
    }
}

impl<'c> MarkupEngine<'c> {
    pub fn with_catalog(semantic: Semantic, catalog: &'c TypeCatalog) -> Self {
        Self {
            catalog,
            vocabulary: semantic.vocabulary(),
            state: RenderState::default(),
        }
    }

    pub fn semantic(&self) -> Semantic {
        self.vocabulary.semantic()
    }

    pub fn vocabulary(&self) -> &'static dyn Vocabulary {
        self.vocabulary
    }

    pub fn catalog(&self) -> &'c TypeCatalog {
        self.catalog
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Set the current item type. Unknown types become `Thing`.
    pub fn set_type(&mut self, type_name: &str) -> &mut Self {
        self.state.current_type = self.catalog.sanitize_type(type_name).to_string();
        self
    }

    /// Set the property to render. Checked against the current type at
    /// display time.
    pub fn property(&mut self, name: &str) -> &mut Self {
        self.state.property = Some(name.to_string());
        self
    }

    /// Set the human content; clears any machine content.
    pub fn content(&mut self, human: &str) -> &mut Self {
        self.state.content = Some(human.to_string());
        self.state.machine_content = None;
        self
    }

    /// Set human content plus a machine-readable form for `<meta>` output.
    pub fn content_with_machine(&mut self, human: &str, machine: &str) -> &mut Self {
        self.state.content = Some(human.to_string());
        self.state.machine_content = Some(machine.to_string());
        self
    }

    /// Set the fallback used when the property isn't in the current type.
    ///
    /// The type is sanitized; the property is kept only if it belongs to
    /// that type.
    pub fn fallback(&mut self, type_name: &str, property: &str) -> &mut Self {
        let type_name = self.catalog.sanitize_type(type_name);
        self.state.fallback_property = self
            .catalog
            .is_property_in_type(type_name, property)
            .then(|| property.to_string());
        self.state.fallback_type = Some(type_name.to_string());
        self
    }

    /// Toggle markup output. A disabled engine returns plain content, or
    /// nothing for a `<meta>` element.
    pub fn enable(&mut self, enabled: bool) -> &mut Self {
        self.state.enabled = enabled;
        self
    }

    /// Render the pending annotation and reset it.
    pub fn display(&mut self, kind: DisplayKind, invert: bool) -> String {
        let request = self.state.take_request(kind, invert);
        if !self.state.enabled {
            if kind == DisplayKind::Meta {
                return String::new();
            }
            return request.content.unwrap_or_default();
        }
        render(self.vocabulary, self.catalog, &request)
    }

    /// Load a parsed marker. Its type becomes current and its scope is
    /// returned; its property (and fallback, only alongside a property)
    /// become pending for the next `display`.
    pub fn load_marker(&mut self, marker: &Marker) -> Option<String> {
        let scope = marker.type_name.as_deref().map(|type_name| {
            self.set_type(type_name);
            self.display_scope()
        });

        if let Some(property) = marker.property.as_deref() {
            if marker.has_fallback() {
                let fallback_type = marker
                    .fallback_type
                    .clone()
                    .unwrap_or_else(|| self.state.current_type.clone());
                let fallback_property = marker.fallback_property.as_deref().unwrap_or("");
                self.fallback(&fallback_type, fallback_property);
            }
            self.property(property);
        }
        scope
    }

    /// Every fragment a marker produces: its scope, the inline attribute the
    /// rewriter would emit, and the automatic layout around `content`.
    pub fn resolve(&mut self, marker: &Marker, content: Option<&str>) -> Resolution {
        let scope = self.load_marker(marker);
        let (inline, auto) = if marker.property.is_some() {
            let inline = self.clone().display(DisplayKind::Inline, false);
            if let Some(content) = content {
                self.content(content);
            }
            (Some(inline), Some(self.display(DisplayKind::Auto, false)))
        } else {
            (None, None)
        };
        Resolution {
            current_type: self.state.current_type.clone(),
            scope,
            inline,
            auto,
        }
    }

    /// Scope attributes for the current type, or `""` when disabled.
    pub fn display_scope(&self) -> String {
        if !self.state.enabled {
            return String::new();
        }
        self.vocabulary.html_scope_in(self.catalog, &self.state.current_type)
    }

    pub fn current_type(&self) -> &str {
        &self.state.current_type
    }

    pub fn current_property(&self) -> Option<&str> {
        self.state.property.as_deref()
    }

    pub fn content_value(&self) -> Option<&str> {
        self.state.content.as_deref()
    }

    pub fn machine_content(&self) -> Option<&str> {
        self.state.machine_content.as_deref()
    }

    pub fn fallback_type(&self) -> Option<&str> {
        self.state.fallback_type.as_deref()
    }

    pub fn fallback_property(&self) -> Option<&str> {
        self.state.fallback_property.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }
}
