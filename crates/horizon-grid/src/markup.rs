//! Markup text builders.
//!
//! The grid emits its cell, header and child-row templates as markup text that
//! the binding host parses later. These helpers assemble that text. Attribute
//! values are inserted verbatim; callers are responsible for producing safe
//! attribute text.
//!
//! # Example
//!
//! ```
//! use horizon_grid::markup::{BindingMap, Content, build_binding, build_element};
//!
//! let binding = BindingMap::new()
//!     .with("text", "title")
//!     .with("css", BindingMap::new().with("active", "isActive"));
//!
//! let span = build_element("span", [build_binding(&binding)], Content::Empty);
//! assert_eq!(span, r#"<span data-bind="text:title,css:{active:isActive}"></span>"#);
//! ```

use std::fmt::Write as _;

/// Attribute name used for declarative bindings.
pub const DATA_BIND: &str = "data-bind";

/// Content placed inside a built element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Content {
    /// No children: `<tag></tag>`.
    #[default]
    Empty,
    /// Literal inner markup: `<tag>text</tag>`.
    Text(String),
    /// Self-closing form with no children: `<tag/>`.
    SelfClosing,
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Build `<tag attr="v"...>content</tag>`, or `<tag attr="v".../>` for
/// [`Content::SelfClosing`].
pub fn build_element<I, K, V>(tag: &str, attributes: I, content: Content) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut element = format!("<{tag}");
    for (name, value) in attributes {
        let _ = write!(element, " {}=\"{}\"", name.as_ref(), value.as_ref());
    }

    match content {
        Content::SelfClosing => element.push_str("/>"),
        Content::Empty => {
            let _ = write!(element, "></{tag}>");
        }
        Content::Text(text) => {
            let _ = write!(element, ">{text}</{tag}>");
        }
    }
    element
}

/// A value inside a [`BindingMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingValue {
    /// A raw expression token, emitted unquoted.
    Expr(String),
    /// A nested binding group, emitted as `{...}`.
    Group(BindingMap),
}

impl From<&str> for BindingValue {
    fn from(expr: &str) -> Self {
        Self::Expr(expr.to_string())
    }
}

impl From<String> for BindingValue {
    fn from(expr: String) -> Self {
        Self::Expr(expr)
    }
}

impl From<BindingMap> for BindingValue {
    fn from(group: BindingMap) -> Self {
        Self::Group(group)
    }
}

/// An insertion-ordered map of binding keys to expressions or nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingMap {
    entries: Vec<(String, BindingValue)>,
}

impl BindingMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<BindingValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<BindingValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the comma-joined `key:value` expression.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| match value {
                BindingValue::Expr(expr) => format!("{key}:{expr}"),
                BindingValue::Group(group) => format!("{key}:{{{}}}", group.render()),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Serialize a binding map into a single `data-bind` attribute.
pub fn build_binding(map: &BindingMap) -> (&'static str, String) {
    (DATA_BIND, map.render())
}
