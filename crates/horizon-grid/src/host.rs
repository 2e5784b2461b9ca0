//! Interfaces to the grid's external collaborators.
//!
//! The grid does not render anything itself. It drives:
//!
//! - an [`Element`]: the DOM node the grid is bound to, and its row/cell nodes
//! - a [`BindingHost`]: renders templates into nodes under a [`BindingContext`]
//! - a [`TablePlugin`], created by a [`TableFactory`]: the table widget with
//!   its own paging, sorting and searching engine
//! - optionally [`ResponsiveColumns`] and an [`Animator`]
//!
//! Everything the grid needs from those collaborators is expressed here as
//! traits so any rendering backend (or an in-memory fake) can stand behind
//! them.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::column::ColumnModel;
use crate::error::Result;
use crate::options::{OrderEntry, TableOptions};
use crate::row::Row;

/// Keyboard modifier state of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickEvent {
    /// Control key held.
    pub ctrl: bool,
    /// Shift key held.
    pub shift: bool,
    /// Alt/option key held.
    pub alt: bool,
    /// Meta/command key held.
    pub meta: bool,
}

impl ClickEvent {
    /// A click with no modifier held.
    pub fn plain() -> Self {
        Self::default()
    }

    /// A click with the control key held.
    pub fn with_ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    /// A click with the shift key held.
    pub fn with_shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

/// Click handler registered on an element.
pub type ClickHandler = Box<dyn Fn(&ClickEvent) + Send + Sync>;

/// One-shot handler run when an element is disposed.
pub type DisposeHandler = Box<dyn FnOnce() + Send>;

/// Completion callback for asynchronous host work.
pub type Done = Box<dyn FnOnce() + Send>;

/// A DOM node.
pub trait Element: Send + Sync {
    /// Lowercase tag name, e.g. `"table"`.
    fn tag_name(&self) -> String;

    /// Add a CSS class.
    fn add_class(&self, class: &str);

    /// Remove a CSS class.
    fn remove_class(&self, class: &str);

    /// Returns `true` if the element has the CSS class.
    fn has_class(&self, class: &str) -> bool;

    /// Set (or with `None`, remove) an inline style property.
    fn set_style(&self, property: &str, value: Option<&str>);

    /// Register a click handler.
    fn on_click(&self, handler: ClickHandler);

    /// Register a handler for when the node is removed from the document.
    fn on_dispose(&self, handler: DisposeHandler);
}

/// Data scoped by a [`BindingContext`].
#[derive(Clone)]
pub enum ContextData {
    /// A grid row.
    Row(Row),
    /// A column (header and footer cells).
    Column(Arc<ColumnModel>),
    /// Any other value.
    Value(Value),
}

impl fmt::Debug for ContextData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(row) => f.debug_tuple("Row").field(&row.id()).finish(),
            Self::Column(column) => f.debug_tuple("Column").field(&column.name()).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

struct ContextInner {
    data: ContextData,
    alias: Option<String>,
    parent: Option<BindingContext>,
}

/// A scoped data environment templates are rendered under.
///
/// Child contexts introduce a value, optionally under an alias, while keeping
/// the enclosing scopes reachable.
#[derive(Clone)]
pub struct BindingContext {
    inner: Arc<ContextInner>,
}

impl BindingContext {
    /// A root context for `data`.
    pub fn root(data: ContextData) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                data,
                alias: None,
                parent: None,
            }),
        }
    }

    /// A child scope holding `data`, reachable as `alias` when given.
    pub fn child(&self, data: ContextData, alias: Option<&str>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                data,
                alias: alias.map(str::to_string),
                parent: Some(self.clone()),
            }),
        }
    }

    /// The data of this scope.
    pub fn data(&self) -> &ContextData {
        &self.inner.data
    }

    /// The alias this scope was introduced under.
    pub fn alias(&self) -> Option<&str> {
        self.inner.alias.as_deref()
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<&BindingContext> {
        self.inner.parent.as_ref()
    }

    /// The nearest scope (this one included) introduced under `alias`.
    pub fn lookup(&self, alias: &str) -> Option<&ContextData> {
        let mut scope = Some(self);
        while let Some(context) = scope {
            if context.alias() == Some(alias) {
                return Some(context.data());
            }
            scope = context.parent();
        }
        None
    }

    /// The nearest row in scope.
    pub fn row(&self) -> Option<&Row> {
        let mut scope = Some(self);
        while let Some(context) = scope {
            if let ContextData::Row(row) = context.data() {
                return Some(row);
            }
            scope = context.parent();
        }
        None
    }

    /// Number of enclosing scopes.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.parent();
        while let Some(context) = scope {
            depth += 1;
            scope = context.parent();
        }
        depth
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("data", &self.inner.data)
            .field("alias", &self.inner.alias)
            .field("depth", &self.depth())
            .finish()
    }
}

/// The reactive rendering engine.
pub trait BindingHost: Send + Sync {
    /// Replace `target`'s children with `template` bound to `context`.
    fn render_template(
        &self,
        template: &str,
        context: &BindingContext,
        target: &Arc<dyn Element>,
    ) -> Result<()>;

    /// Bind the markup already inside `target` to `context`.
    fn apply_bindings(&self, context: &BindingContext, target: &Arc<dyn Element>) -> Result<()>;

    /// Release every binding under `target`.
    fn clean_node(&self, target: &Arc<dyn Element>);
}

/// Row/column/cell nodes of a realized row, one entry per column position.
///
/// `None` marks a column the plugin has not realized (for example a column
/// currently hidden by the responsive capability).
pub type CellNodes = Vec<Option<Arc<dyn Element>>>;

/// Paging, sorting and searching request issued by the plugin in server mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerRequest {
    /// Draw counter, echoed back in [`ServerPage::draw`].
    pub draw: u64,
    /// Offset of the first row.
    pub start: usize,
    /// Page size.
    pub length: usize,
    /// Global search text.
    pub search: String,
    /// Sort keys.
    pub order: Vec<OrderEntry>,
    /// Per-column search state, in column order.
    pub columns: Vec<ServerColumn>,
}

/// One column of a [`ServerRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerColumn {
    /// Column key.
    pub name: String,
    /// Active per-column search text; empty when not filtering.
    pub search_value: String,
}

/// A page of rows answering a [`ServerRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPage {
    /// Draw counter of the request being answered.
    pub draw: u64,
    /// The page's rows.
    pub data: Vec<Row>,
    /// Total records before filtering.
    pub records_total: usize,
    /// Total records after filtering.
    pub records_filtered: usize,
}

/// Completion callback for a [`ServerRequest`].
pub type ServerCallback = Box<dyn FnOnce(ServerPage) + Send>;

/// Invoked when the plugin realizes a body row: the row, its node and its cells.
pub type RowCreated = Arc<dyn Fn(&Row, &Arc<dyn Element>, &CellNodes) + Send + Sync>;

/// Invoked when the plugin realizes the header or footer cells.
pub type SectionCreated = Arc<dyn Fn(&CellNodes) + Send + Sync>;

/// Invoked when the plugin needs a page of data in server mode.
pub type ServerRequestHandler = Arc<dyn Fn(ServerRequest, ServerCallback) + Send + Sync>;

/// Callbacks the plugin invokes during and after attachment.
#[derive(Clone)]
pub struct TableCallbacks {
    /// A body row was realized.
    pub row_created: RowCreated,
    /// The header row was realized.
    pub header_created: SectionCreated,
    /// The footer row was realized.
    pub footer_created: SectionCreated,
    /// Server-mode data request; `None` in client mode.
    pub server_request: Option<ServerRequestHandler>,
}

impl fmt::Debug for TableCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCallbacks")
            .field("server_request", &self.server_request.is_some())
            .finish_non_exhaustive()
    }
}

/// Responsive column-hiding capability.
pub trait ResponsiveColumns: Send + Sync {
    /// Exclude (or re-include) a column from responsive hiding.
    fn set_ignore_column(&self, index: usize, ignore: bool);

    /// Register a resize callback receiving, per column, whether it is now hidden.
    fn on_resize(&self, callback: Box<dyn Fn(&[bool]) + Send + Sync>);
}

/// An attached table widget.
pub trait TablePlugin: Send + Sync {
    /// Append rows.
    fn add_rows(&self, rows: &[Row]);

    /// Remove rows.
    fn remove_rows(&self, rows: &[Row]);

    /// Redraw with the current client-side data.
    fn draw(&self);

    /// Show a page of server data.
    fn draw_page(&self, page: ServerPage);

    /// Show or hide a column.
    fn set_column_visible(&self, index: usize, visible: bool);

    /// Apply a sort order.
    fn order(&self, order: &[OrderEntry]);

    /// Rows currently realized as nodes.
    fn rows(&self) -> Vec<Row>;

    /// The realized node for `row`, with its cells.
    fn row_nodes(&self, row: &Row) -> Option<(Arc<dyn Element>, CellNodes)>;

    /// Header cells, one entry per column.
    fn header_cells(&self) -> CellNodes;

    /// Footer cells, one entry per column.
    fn footer_cells(&self) -> CellNodes;

    /// Open `row`'s detail area with `markup`; returns its top-level nodes.
    fn show_child(&self, row: &Row, markup: &str) -> Result<Vec<Arc<dyn Element>>>;

    /// Collapse `row`'s detail area.
    fn hide_child(&self, row: &Row);

    /// The responsive capability, when the plugin has one.
    fn responsive(&self) -> Option<Arc<dyn ResponsiveColumns>>;

    /// Tear the widget down.
    fn destroy(&self);
}

/// Creates table plugins.
pub trait TableFactory: Send + Sync {
    /// Attach a table widget to `element`. Creation callbacks may fire before
    /// this returns.
    fn attach(
        &self,
        element: &Arc<dyn Element>,
        options: &TableOptions,
        callbacks: TableCallbacks,
    ) -> Result<Arc<dyn TablePlugin>>;
}

/// Animation options for child rows.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Animation {
    /// Transition length in milliseconds.
    pub duration_ms: u64,
    /// Easing function name.
    pub easing: String,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            easing: "swing".to_string(),
        }
    }
}

/// Runs show/hide transitions.
pub trait Animator: Send + Sync {
    /// Transition `element` into view, then call `done`.
    fn reveal(&self, element: &Arc<dyn Element>, animation: &Animation, done: Done);

    /// Transition `element` out of view, then call `done`.
    fn conceal(&self, element: &Arc<dyn Element>, animation: &Animation, done: Done);
}
