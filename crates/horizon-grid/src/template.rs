//! Cell template registry and template resolution.
//!
//! A [`TemplateRegistry`] maps a column type tag to a factory producing that
//! type's cell markup. It is an explicit value owned by the grid settings, so
//! two grids may use different editors for the same tag.
//!
//! Template text goes through [`resolve_template`]: text that looks like a bare
//! identifier is a reference to an externally defined template and is wrapped
//! in a named-template directive, anything else is inline markup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::markup::{BindingMap, Content, build_binding, build_element};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$A-Za-z_][$0-9A-Za-z_]*$").expect("identifier pattern is valid")
});

/// Produces cell markup for a column given its value expression.
pub type TemplateFactory = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Returns `true` if `text` is a bare template name rather than markup.
pub fn is_template_name(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// The directive that renders the external template called `name`.
pub fn named_template(name: &str) -> String {
    format!("<!-- ko template:'{name}' --><!-- /ko -->")
}

/// Wrap bare template names; return markup unchanged.
pub fn resolve_template(text: String) -> String {
    if is_template_name(&text) {
        named_template(&text)
    } else {
        text
    }
}

/// A template given either as text or as a function producing text.
#[derive(Clone)]
pub enum TemplateSource {
    /// Markup or a bare template name.
    Markup(String),
    /// Invoked once, during column normalization.
    Factory(Arc<dyn Fn() -> String + Send + Sync>),
}

impl TemplateSource {
    /// Create a template from a function.
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    /// Produce the final markup, invoking the factory if needed.
    pub fn resolve(&self) -> String {
        match self {
            Self::Markup(text) => resolve_template(text.clone()),
            Self::Factory(f) => resolve_template(f()),
        }
    }

    /// Returns `true` for an empty markup string.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Markup(text) if text.trim().is_empty())
    }
}

impl From<&str> for TemplateSource {
    fn from(text: &str) -> Self {
        Self::Markup(text.to_string())
    }
}

impl From<String> for TemplateSource {
    fn from(text: String) -> Self {
        Self::Markup(text)
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markup(text) => f.debug_tuple("Markup").field(text).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for TemplateSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::Markup)
    }
}

/// Type tag to cell-template factory mapping.
#[derive(Clone)]
pub struct TemplateRegistry {
    factories: HashMap<String, TemplateFactory>,
}

impl TemplateRegistry {
    /// A registry with the built-in `control`, `text`, `string` and `checkbox` templates.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("control", |_| String::new());
        registry.register("text", |value| {
            build_element(
                "span",
                [build_binding(&BindingMap::new().with("text", value))],
                Content::Empty,
            )
        });
        registry.register("string", |value| {
            build_element(
                "input",
                [build_binding(&BindingMap::new().with("value", value))],
                Content::SelfClosing,
            )
        });
        registry.register("checkbox", |value| {
            let (bind, expr) = build_binding(&BindingMap::new().with("checked", value));
            build_element(
                "input",
                [("type", "checkbox"), (bind, expr.as_str())],
                Content::SelfClosing,
            )
        });
        registry
    }

    /// A registry with no templates at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the factory for `tag`.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.factories.insert(tag.into(), Arc::new(factory));
    }

    /// Returns `true` if `tag` has a factory.
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Cell markup for a column of type `tag` showing `value`.
    ///
    /// Unregistered tags refer to an external template of the same name.
    pub fn render(&self, tag: &str, value: &str) -> String {
        match self.factories.get(tag) {
            Some(factory) => resolve_template(factory(value)),
            None => named_template(tag),
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("TemplateRegistry").field("tags", &tags).finish()
    }
}
