//! Column models.
//!
//! A column is specified loosely (a bare name, a [`ColumnSpec`], or an already
//! built [`ColumnModel`]) and normalized once, during grid initialization, into
//! a canonical [`ColumnModel`] whose cell, header and footer templates are
//! fully resolved markup. After normalization only the column's visibility
//! can change.
//!
//! When a grid has no column specifications, [`infer_columns`] derives one
//! column per field of the first row, using a [`TypeDetector`] to choose each
//! column's editor type.

use std::fmt;
use std::sync::{Arc, LazyLock};

use horizon_grid_core::{IdGenerator, Observable};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::markup::{BindingMap, Content, build_binding, build_element};
use crate::options::ColumnDef;
use crate::row::Row;
use crate::template::{TemplateRegistry, TemplateSource};

static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("case boundary pattern is valid"));

/// Editor/type tag of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    /// Non-data column reserved for UI affordances.
    Control,
    /// Read-only text display.
    #[default]
    Text,
    /// Editable text input.
    String,
    /// Editable boolean checkbox.
    Checkbox,
    /// Any other tag; rendered by a registered factory or a named template.
    Custom(std::string::String),
}

impl ColumnType {
    /// The tag used to look up templates.
    pub fn tag(&self) -> &str {
        match self {
            Self::Control => "control",
            Self::Text => "text",
            Self::String => "string",
            Self::Checkbox => "checkbox",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse a tag; unknown tags become [`ColumnType::Custom`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "control" => Self::Control,
            "text" => Self::Text,
            "string" => Self::String,
            "checkbox" => Self::Checkbox,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        std::string::String::deserialize(deserializer).map(|tag| Self::from_tag(&tag))
    }
}

/// Chooses a column type from a sample value.
pub type TypeDetector = Arc<dyn Fn(&Value) -> ColumnType + Send + Sync>;

/// Strings edit as text inputs, booleans as checkboxes, everything else displays as text.
pub fn default_type_detector(value: &Value) -> ColumnType {
    match value {
        Value::String(_) => ColumnType::String,
        Value::Bool(_) => ColumnType::Checkbox,
        _ => ColumnType::Text,
    }
}

/// Display title for a field name.
///
/// Underscores become spaces and a space is inserted between a lowercase
/// letter and a following uppercase letter: `user_id` gives `user id`,
/// `firstName` gives `first Name`.
pub fn derive_title(name: &str) -> String {
    let spaced = name.replace('_', " ");
    CASE_BOUNDARY.replace_all(&spaced, "$1 $2").into_owned()
}

/// A loosely specified column, loadable from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSpec {
    name: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ColumnType>,
    template: Option<TemplateSource>,
    header: Option<TemplateSource>,
    footer: Option<TemplateSource>,
    data: Option<String>,
    visible: Option<bool>,
    #[serde(skip)]
    visible_observable: Option<Observable<bool>>,
    orderable: Option<bool>,
    searchable: Option<bool>,
    #[serde(alias = "className")]
    class_name: Option<String>,
    #[serde(alias = "defaultContent")]
    default_content: Option<String>,
    control: bool,
    object: Option<bool>,
}

impl ColumnSpec {
    /// An empty spec; every field takes its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// A spec for the column called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the display title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the column type.
    pub fn kind(mut self, kind: ColumnType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the cell template (markup, template name, or factory).
    pub fn template(mut self, template: impl Into<TemplateSource>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the header template.
    pub fn header(mut self, header: impl Into<TemplateSource>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Set the footer template.
    pub fn footer(mut self, footer: impl Into<TemplateSource>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Set the source field key.
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the initial visibility.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Share an existing visibility observable with the column.
    pub fn visible_observable(mut self, visible: Observable<bool>) -> Self {
        self.visible_observable = Some(visible);
        self
    }

    /// Set whether the column can be sorted.
    pub fn orderable(mut self, orderable: bool) -> Self {
        self.orderable = Some(orderable);
        self
    }

    /// Set whether the column takes part in searching.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = Some(searchable);
        self
    }

    /// Set the CSS class applied to the column's cells.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the content shown when the cell has no value.
    pub fn default_content(mut self, content: impl Into<String>) -> Self {
        self.default_content = Some(content.into());
        self
    }

    /// Mark this as a control column.
    pub fn control(mut self) -> Self {
        self.control = true;
        self
    }

    /// Declare whether rows are objects (value by field name) or arrays
    /// (value by position). Defaults to the grid's row shape.
    pub fn object(mut self, object: bool) -> Self {
        self.object = Some(object);
        self
    }
}

/// Anything a column can be specified as.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnInput {
    /// A bare column name.
    Name(String),
    /// A column specification.
    Spec(ColumnSpec),
    /// An already normalized column.
    #[serde(skip)]
    Model(ColumnModel),
}

impl From<&str> for ColumnInput {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnInput {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<ColumnSpec> for ColumnInput {
    fn from(spec: ColumnSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<ColumnModel> for ColumnInput {
    fn from(model: ColumnModel) -> Self {
        Self::Model(model)
    }
}

/// What normalization needs to know about the grid a column belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ColumnEnv<'a> {
    /// Type-tag templates.
    pub registry: &'a TemplateRegistry,
    /// Source of generated column names.
    pub ids: &'a IdGenerator,
    /// Position of the column in the grid.
    pub index: usize,
    /// Whether the grid's rows are objects rather than arrays.
    pub object_rows: bool,
}

/// A canonical, template-resolved column.
#[derive(Debug, Clone)]
pub struct ColumnModel {
    name: String,
    title: String,
    kind: ColumnType,
    template: String,
    header: String,
    footer: String,
    data: Option<String>,
    visible: Observable<bool>,
    orderable: bool,
    searchable: bool,
    class_name: String,
    default_content: Option<String>,
    index: usize,
    object: bool,
    value: String,
}

impl ColumnModel {
    /// Normalize any accepted column input.
    pub fn normalize(input: impl Into<ColumnInput>, env: &ColumnEnv<'_>) -> Self {
        match input.into() {
            ColumnInput::Name(name) => Self::from_spec(ColumnSpec::named(name.clone()).title(name), env),
            ColumnInput::Spec(spec) => Self::from_spec(spec, env),
            ColumnInput::Model(model) => model.reindexed(env.index),
        }
    }

    /// Normalize a column specification.
    pub fn from_spec(spec: ColumnSpec, env: &ColumnEnv<'_>) -> Self {
        let mut kind = spec.kind.unwrap_or_default();
        let name = spec.name.unwrap_or_else(|| env.ids.next_id());
        let mut title = spec.title.unwrap_or_else(|| derive_title(&name));
        let mut class_name = spec.class_name.unwrap_or_default();
        let mut orderable = spec.orderable.unwrap_or(true);
        let mut default_content = spec.default_content;

        if spec.control {
            title.clear();
            class_name = if class_name.is_empty() {
                "control".to_string()
            } else {
                format!("{class_name} control")
            };
            orderable = false;
            default_content = Some(String::new());
            kind = ColumnType::Control;
        }

        let object = spec.object.unwrap_or(env.object_rows);
        let data = match spec.data {
            Some(data) => Some(data),
            None if object => Some(name.clone()),
            None => None,
        };
        let value = if object {
            data.clone().unwrap_or_else(|| name.clone())
        } else {
            format!("$data[{}]", env.index)
        };

        let template = match spec.template {
            Some(source) => source.resolve(),
            None => env.registry.render(kind.tag(), &value),
        };
        let header = match spec.header {
            Some(source) => source.resolve(),
            None => default_header(),
        };
        let footer = spec.footer.map(|source| source.resolve()).unwrap_or_default();

        let visible = match spec.visible_observable {
            Some(visible) => visible,
            None => Observable::new(spec.visible.unwrap_or(true)),
        };

        Self {
            name,
            title,
            kind,
            template,
            header,
            footer,
            data,
            visible,
            orderable,
            searchable: spec.searchable.unwrap_or(false),
            class_name,
            default_content,
            index: env.index,
            object,
            value,
        }
    }

    fn reindexed(mut self, index: usize) -> Self {
        if !self.object && self.index != index {
            self.value = format!("$data[{index}]");
        }
        self.index = index;
        self
    }

    /// Unique key of the column within its grid.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Editor/type tag.
    pub fn kind(&self) -> &ColumnType {
        &self.kind
    }

    /// Resolved cell markup.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolved header markup.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Resolved footer markup (empty when the column has no footer).
    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Source field key, if any.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Visibility observable; the only part of a column that changes after
    /// normalization.
    pub fn visible(&self) -> &Observable<bool> {
        &self.visible
    }

    /// Whether the column can be sorted.
    pub fn is_orderable(&self) -> bool {
        self.orderable
    }

    /// Whether the column takes part in searching.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Extra CSS class for the column's cells.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Content shown for an empty cell.
    pub fn default_content(&self) -> Option<&str> {
        self.default_content.as_deref()
    }

    /// Position of the column in its grid.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Binding expression reading this column's value from a row.
    pub fn value_expression(&self) -> &str {
        &self.value
    }

    /// Class attribute of the column's cells: `"<type> <name> <className>"`.
    pub fn cell_class(&self) -> String {
        format!("{} {} {}", self.kind, self.name, self.class_name)
            .trim_end()
            .to_string()
    }

    /// The cell's markup wrapped in its `<td>`.
    pub fn cell_markup(&self) -> String {
        build_element(
            "td",
            [("class", self.cell_class())],
            Content::Text(self.template.clone()),
        )
    }

    /// The table plugin's view of this column.
    pub fn definition(&self) -> ColumnDef {
        ColumnDef {
            name: self.name.clone(),
            title: self.title.clone(),
            data: self.data.clone(),
            kind: self.kind.clone(),
            orderable: self.orderable,
            searchable: self.searchable,
            visible: self.visible.get(),
            class_name: self.class_name.clone(),
            default_content: self.default_content.clone(),
        }
    }
}

fn default_header() -> String {
    build_element(
        "span",
        [build_binding(&BindingMap::new().with("text", "title"))],
        Content::Empty,
    )
}

/// Derive one column per field of `first_row`.
///
/// Array rows keep their positional keys as titles; object rows derive titles
/// from field names. Fails with [`GridError::NoInferableData`] when there is no
/// first row or it has no fields.
pub fn infer_columns(
    first_row: Option<&Row>,
    detector: &TypeDetector,
    registry: &TemplateRegistry,
    ids: &IdGenerator,
) -> Result<Vec<ColumnModel>> {
    let row = first_row.ok_or(GridError::NoInferableData)?;
    if row.is_empty() {
        return Err(GridError::NoInferableData);
    }

    let object_rows = !row.is_array();
    Ok(row
        .keys()
        .into_iter()
        .enumerate()
        .map(|(index, key)| {
            let sample = row.value(&key).unwrap_or(Value::Null);
            let title = if object_rows {
                derive_title(&key)
            } else {
                key.clone()
            };
            let spec = ColumnSpec::named(key)
                .title(title)
                .kind(detector(&sample))
                .object(object_rows);
            ColumnModel::from_spec(
                spec,
                &ColumnEnv {
                    registry,
                    ids,
                    index,
                    object_rows,
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env<'a>(registry: &'a TemplateRegistry, ids: &'a IdGenerator, index: usize) -> ColumnEnv<'a> {
        ColumnEnv {
            registry,
            ids,
            index,
            object_rows: true,
        }
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("user_id"), "user id");
        assert_eq!(derive_title("firstName"), "first Name");
        assert_eq!(derive_title("plain"), "plain");
        assert_eq!(derive_title("HTTPCode"), "HTTPCode");
        assert_eq!(derive_title("a_bC"), "a b C");
    }

    #[test]
    fn test_defaults() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let column = ColumnModel::from_spec(ColumnSpec::new(), &env(&registry, &ids, 0));

        assert_eq!(column.name(), "column_0");
        assert_eq!(column.title(), "column 0");
        assert_eq!(column.kind(), &ColumnType::Text);
        assert!(column.visible().get());
        assert!(column.is_orderable());
        assert!(!column.is_searchable());
        assert_eq!(column.header(), r#"<span data-bind="text:title"></span>"#);
        assert_eq!(column.footer(), "");
        assert_eq!(column.template(), r#"<span data-bind="text:column_0"></span>"#);
    }

    #[test]
    fn test_bare_name() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let column = ColumnModel::normalize("email", &env(&registry, &ids, 0));
        assert_eq!(column.name(), "email");
        assert_eq!(column.title(), "email");
        assert_eq!(ids.issued(), 0);
    }

    #[test]
    fn test_control_column() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let spec = ColumnSpec::named("expand")
            .title("Expand")
            .class_name("narrow")
            .kind(ColumnType::String)
            .control();
        let column = ColumnModel::from_spec(spec, &env(&registry, &ids, 0));

        assert_eq!(column.title(), "");
        assert_eq!(column.class_name(), "narrow control");
        assert!(!column.is_orderable());
        assert_eq!(column.default_content(), Some(""));
        assert_eq!(column.kind(), &ColumnType::Control);
        assert_eq!(column.template(), "");
        assert_eq!(column.cell_class(), "control expand narrow control");
    }

    #[test]
    fn test_template_resolution() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let named = ColumnModel::from_spec(
            ColumnSpec::named("a").template("personCell").header("<b>A</b>"),
            &env(&registry, &ids, 0),
        );
        assert_eq!(named.template(), "<!-- ko template:'personCell' --><!-- /ko -->");
        assert_eq!(named.header(), "<b>A</b>");

        let produced = ColumnModel::from_spec(
            ColumnSpec::named("b").template(TemplateSource::factory(|| "<i></i>".to_string())),
            &env(&registry, &ids, 1),
        );
        assert_eq!(produced.template(), "<i></i>");

        let footer = ColumnModel::from_spec(
            ColumnSpec::named("c").footer("totals"),
            &env(&registry, &ids, 2),
        );
        assert_eq!(footer.footer(), "<!-- ko template:'totals' --><!-- /ko -->");
    }

    #[test]
    fn test_custom_type_template() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let column = ColumnModel::from_spec(
            ColumnSpec::named("tags").kind(ColumnType::from_tag("chips")),
            &env(&registry, &ids, 0),
        );
        assert_eq!(column.template(), "<!-- ko template:'chips' --><!-- /ko -->");
    }

    #[test]
    fn test_array_value_expression() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let column = ColumnModel::from_spec(
            ColumnSpec::named("1").kind(ColumnType::String),
            &ColumnEnv {
                registry: &registry,
                ids: &ids,
                index: 1,
                object_rows: false,
            },
        );
        assert_eq!(column.value_expression(), "$data[1]");
        assert_eq!(column.template(), r#"<input data-bind="value:$data[1]"/>"#);
        assert_eq!(column.data(), None);
    }

    #[test]
    fn test_shared_visibility() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let shown = Observable::new(false);
        let column = ColumnModel::from_spec(
            ColumnSpec::named("a").visible_observable(shown.clone()),
            &env(&registry, &ids, 0),
        );
        shown.set(true);
        assert!(column.visible().get());
    }

    #[test]
    fn test_infer_columns() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let detector: TypeDetector = Arc::new(default_type_detector);
        let row = Row::try_from(json!({"a": "x", "b": true, "c": 3})).unwrap();

        let columns = infer_columns(Some(&row), &detector, &registry, &ids).unwrap();
        let kinds: Vec<(&str, &ColumnType)> =
            columns.iter().map(|c| (c.name(), c.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                ("a", &ColumnType::String),
                ("b", &ColumnType::Checkbox),
                ("c", &ColumnType::Text),
            ]
        );
    }

    #[test]
    fn test_infer_from_empty_row_fails() {
        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let detector: TypeDetector = Arc::new(default_type_detector);
        let empty = Row::try_from(json!({})).unwrap();

        assert_eq!(
            infer_columns(Some(&empty), &detector, &registry, &ids).unwrap_err(),
            GridError::NoInferableData
        );
        assert_eq!(
            infer_columns(None, &detector, &registry, &ids).unwrap_err(),
            GridError::NoInferableData
        );
    }

    #[test]
    fn test_spec_from_json() {
        let inputs: Vec<ColumnInput> = serde_json::from_value(json!([
            "id",
            {"name": "first_name", "type": "string", "className": "wide"},
            {"control": true}
        ]))
        .unwrap();

        let registry = TemplateRegistry::new();
        let ids = IdGenerator::new("column_");
        let columns: Vec<ColumnModel> = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| ColumnModel::normalize(input, &env(&registry, &ids, index)))
            .collect();

        assert_eq!(columns[0].name(), "id");
        assert_eq!(columns[1].title(), "first name");
        assert_eq!(columns[1].kind(), &ColumnType::String);
        assert_eq!(columns[1].class_name(), "wide");
        assert_eq!(columns[2].name(), "column_0");
        assert_eq!(columns[2].kind(), &ColumnType::Control);
    }
}
