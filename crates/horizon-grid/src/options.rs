//! Table plugin options.
//!
//! [`TableOptions`] is the configuration handed to the table plugin when it is
//! attached. The caller-facing fields can be loaded from JSON configuration;
//! `columns`, `order` and `server_side` are filled in by the grid.

use serde::{Deserialize, Serialize};

use crate::column::{ColumnModel, ColumnType};
use crate::row::Row;

/// Sort direction, serialized as `"ASC"` / `"DEC"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    #[serde(rename = "ASC")]
    Ascending,
    /// Descending order.
    #[serde(rename = "DEC")]
    Descending,
}

impl SortDirection {
    /// The wire string for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DEC",
        }
    }
}

/// One sort key: a column position and a direction.
pub type OrderEntry = (usize, SortDirection);

/// The plugin's view of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    /// Column key.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Source field key.
    pub data: Option<String>,
    /// Editor/type tag.
    #[serde(rename = "type")]
    pub kind: ColumnType,
    /// Whether the column can be sorted.
    pub orderable: bool,
    /// Whether the column takes part in searching.
    pub searchable: bool,
    /// Initial visibility.
    pub visible: bool,
    /// Extra CSS class.
    pub class_name: String,
    /// Content shown for an empty cell.
    pub default_content: Option<String>,
}

/// Options for attaching a table plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Layout string; computed from feature flags when absent.
    pub dom: Option<String>,
    /// Allow users to reorder columns.
    #[serde(alias = "allowColumnReorder")]
    pub allow_column_reorder: bool,
    /// Vertical scrolling viewport height; replaces pagination when set.
    #[serde(alias = "scrollY")]
    pub scroll_y: Option<String>,
    /// Enable pagination.
    pub paging: bool,
    /// Rows per page.
    #[serde(alias = "pageLength")]
    pub page_length: usize,
    /// Column definitions.
    #[serde(skip_deserializing)]
    pub columns: Vec<ColumnDef>,
    /// Initial sort order.
    #[serde(skip_deserializing)]
    pub order: Vec<OrderEntry>,
    /// Whether paging, sorting and searching happen on the server.
    #[serde(skip_deserializing)]
    pub server_side: bool,
    /// Initial client-side rows; empty in server mode.
    #[serde(skip)]
    pub data: Vec<Row>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            dom: None,
            allow_column_reorder: false,
            scroll_y: None,
            paging: true,
            page_length: 20,
            columns: Vec::new(),
            order: Vec::new(),
            server_side: false,
            data: Vec::new(),
        }
    }
}

impl TableOptions {
    /// The layout string: `R` when columns can be reordered, then `ti`, then
    /// `S` for scrolling or `p` for pagination, then `f` when any column is
    /// searchable.
    pub fn default_dom(&self, searchable: bool) -> String {
        let mut dom = String::new();
        if self.allow_column_reorder {
            dom.push('R');
        }
        dom.push_str("ti");
        dom.push(if self.scroll_y.is_some() { 'S' } else { 'p' });
        if searchable {
            dom.push('f');
        }
        dom
    }

    /// Fill in the grid-computed fields for `columns`.
    pub fn complete(&mut self, columns: &[ColumnModel], order: Vec<OrderEntry>, server_side: bool) {
        self.columns = columns.iter().map(ColumnModel::definition).collect();
        self.order = order;
        self.server_side = server_side;
        if self.dom.is_none() {
            let searchable = columns.iter().any(ColumnModel::is_searchable);
            self.dom = Some(self.default_dom(searchable));
        }
    }
}

/// The first orderable column, ascending; empty when no column can be sorted.
pub fn default_order(columns: &[ColumnModel]) -> Vec<OrderEntry> {
    columns
        .iter()
        .find(|column| column.is_orderable())
        .map(|column| vec![(column.index(), SortDirection::Ascending)])
        .unwrap_or_default()
}
