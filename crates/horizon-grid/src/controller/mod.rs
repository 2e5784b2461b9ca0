//! The grid controller.
//!
//! [`init`] binds a table element to a [`DataModel`]. It normalizes the
//! [`GridSettings`], attaches a table plugin through the environment's
//! [`TableFactory`], and keeps the plugin in sync with the model for as long
//! as the element lives.
//!
//! # Lifecycle
//!
//! A grid moves through [`GridState`]:
//!
//! - `Uninitialized -> Bound`: the element is checked to be a `table`, the
//!   data model, columns and child rows are normalized and the table options
//!   are completed.
//! - `Bound -> Live`: the creation callbacks are installed and the plugin is
//!   attached. Every realized cell is bound to its column template exactly once.
//! - `Live`: column visibility, row mutations, server requests and responsive
//!   resizes are kept in sync.
//! - `Live -> Disposed`: when the element is disposed (or [`GridHandle::dispose`]
//!   is called), subscriptions are dropped, the plugin is destroyed and the
//!   destroy hook runs.
//!
//! # Example
//!
//! ```ignore
//! let settings = GridSettings::new(rows)
//!     .columns(["name", "email"])
//!     .selection(Arc::new(SingleSelection::new(SelectionOptions::default())));
//!
//! let grid = init(table_element, settings, &context, environment)?;
//! assert!(grid.controls_descendant_bindings());
//! ```

mod bindings;
mod rows;
mod server;

pub use bindings::{CellBindingId, CellBindings, CellKey, CellSection};
pub use server::{normalize_filters, order_descriptor};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{IdGenerator, ImmediateTaskQueue, Observable, PerfSpan, Subscription, TaskQueue};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::child_row::{ChildRowInput, ChildRowState, ChildRows};
use crate::column::{ColumnEnv, ColumnInput, ColumnModel, TypeDetector, default_type_detector, infer_columns};
use crate::data_model::{DataModel, DataModelInput};
use crate::error::{GridError, Result};
use crate::host::{
    Animator, BindingContext, BindingHost, CellNodes, ContextData, Element, ServerCallback,
    ServerRequest, ServerRequestHandler, TableCallbacks, TableFactory, TablePlugin,
};
use crate::options::{OrderEntry, TableOptions, default_order};
use crate::row::{Row, RowId};
use crate::selection::SelectionModel;
use crate::template::TemplateRegistry;

use bindings::same_node;

/// Called after a body row is bound, with the row and its node.
pub type CreateRowHook = Arc<dyn Fn(&Row, &Arc<dyn Element>) + Send + Sync>;

/// Called with the completed table options just before the plugin is attached.
pub type CreateTableHook = Box<dyn FnOnce(&mut TableOptions) + Send>;

/// Called once the plugin has been destroyed.
pub type DestroyTableHook = Box<dyn FnOnce() + Send>;

/// Called with the attached plugin at the end of initialization.
pub type ApiHook = Box<dyn FnOnce(&Arc<dyn TablePlugin>) + Send>;

/// Published on a responsive resize.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeState {
    /// Column names, in column order.
    pub columns: Vec<String>,
    /// Per column, whether the resize hid it.
    pub hidden_columns: Vec<bool>,
}

/// Everything a grid is configured with.
pub struct GridSettings {
    data_model: DataModelInput,
    column_models: Option<Vec<ColumnInput>>,
    selection_models: Vec<Arc<dyn SelectionModel>>,
    children_models: Vec<ChildRowInput>,
    options: TableOptions,
    order: Option<Vec<OrderEntry>>,
    alias: Option<String>,
    on_create_row: Option<CreateRowHook>,
    on_create_table: Option<CreateTableHook>,
    on_destroy_table: Option<DestroyTableHook>,
    api: Option<ApiHook>,
    resize: Option<Observable<ResizeState>>,
    templates: TemplateRegistry,
    type_detector: TypeDetector,
    column_ids: IdGenerator,
    child_ids: IdGenerator,
}

impl GridSettings {
    /// Settings for a grid over `data_model` (a model, its options, or plain rows).
    pub fn new(data_model: impl Into<DataModelInput>) -> Self {
        Self {
            data_model: data_model.into(),
            column_models: None,
            selection_models: Vec::new(),
            children_models: Vec::new(),
            options: TableOptions::default(),
            order: None,
            alias: None,
            on_create_row: None,
            on_create_table: None,
            on_destroy_table: None,
            api: None,
            resize: None,
            templates: TemplateRegistry::new(),
            type_detector: Arc::new(default_type_detector),
            column_ids: IdGenerator::new("column_"),
            child_ids: IdGenerator::new("child_"),
        }
    }

    /// Explicit columns; inferred from the first row when never set.
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnInput>,
    {
        self.column_models = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add a selection model.
    pub fn selection<S: SelectionModel>(mut self, model: Arc<S>) -> Self {
        self.selection_models.push(model);
        self
    }

    /// Add a child-row model.
    pub fn child(mut self, child: impl Into<ChildRowInput>) -> Self {
        self.children_models.push(child.into());
        self
    }

    /// Table plugin options.
    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Initial sort order, applied once the plugin is attached.
    pub fn order(mut self, order: Vec<OrderEntry>) -> Self {
        self.order = Some(order);
        self
    }

    /// Alias the row is scoped under in cell templates.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Run `hook` after each body row is bound.
    pub fn on_create_row<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row, &Arc<dyn Element>) + Send + Sync + 'static,
    {
        self.on_create_row = Some(Arc::new(hook));
        self
    }

    /// Adjust the completed table options before attachment.
    pub fn on_create_table<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut TableOptions) + Send + 'static,
    {
        self.on_create_table = Some(Box::new(hook));
        self
    }

    /// Run `hook` once the grid is disposed.
    pub fn on_destroy_table<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_destroy_table = Some(Box::new(hook));
        self
    }

    /// Receive the attached plugin.
    pub fn api<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Arc<dyn TablePlugin>) + Send + 'static,
    {
        self.api = Some(Box::new(hook));
        self
    }

    /// Publish responsive resizes to `state`.
    pub fn resize(mut self, state: Observable<ResizeState>) -> Self {
        self.resize = Some(state);
        self
    }

    /// Type-tag templates.
    pub fn templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Column type detection for inferred columns.
    pub fn type_detector<F>(mut self, detector: F) -> Self
    where
        F: Fn(&Value) -> crate::column::ColumnType + Send + Sync + 'static,
    {
        self.type_detector = Arc::new(detector);
        self
    }

    /// Source of generated column names.
    pub fn column_ids(mut self, ids: IdGenerator) -> Self {
        self.column_ids = ids;
        self
    }

    /// Source of generated child-row names.
    pub fn child_ids(mut self, ids: IdGenerator) -> Self {
        self.child_ids = ids;
        self
    }
}

impl fmt::Debug for GridSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSettings")
            .field("columns", &self.column_models.as_ref().map(Vec::len))
            .field("selection_models", &self.selection_models.len())
            .field("children_models", &self.children_models.len())
            .field("options", &self.options)
            .field("order", &self.order)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// The external collaborators a grid drives.
#[derive(Clone)]
pub struct GridEnvironment {
    /// Attaches the table plugin.
    pub factory: Arc<dyn TableFactory>,
    /// Renders and cleans bindings.
    pub host: Arc<dyn BindingHost>,
    /// Child-row transitions; panels show and hide immediately without one.
    pub animator: Option<Arc<dyn Animator>>,
    /// Where deferred work (rebinding after a resize) is posted.
    pub tasks: Arc<dyn TaskQueue>,
}

impl GridEnvironment {
    /// An environment running deferred work inline.
    pub fn new(factory: Arc<dyn TableFactory>, host: Arc<dyn BindingHost>) -> Self {
        Self {
            factory,
            host,
            animator: None,
            tasks: Arc::new(ImmediateTaskQueue),
        }
    }

    /// Use `animator` for child-row transitions.
    pub fn with_animator(mut self, animator: Arc<dyn Animator>) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Post deferred work to `tasks`.
    pub fn with_tasks(mut self, tasks: Arc<dyn TaskQueue>) -> Self {
        self.tasks = tasks;
        self
    }
}

impl fmt::Debug for GridEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEnvironment")
            .field("animator", &self.animator.is_some())
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridState {
    /// Not yet initialized.
    #[default]
    Uninitialized,
    /// Settings normalized; plugin not attached yet.
    Bound,
    /// Attached and in sync.
    Live,
    /// Torn down.
    Disposed,
}

struct PendingRequest {
    draw: u64,
    callback: ServerCallback,
}

struct RealizedRow {
    row: Row,
    node: Arc<dyn Element>,
}

pub(crate) struct GridShared {
    element: Arc<dyn Element>,
    data_model: DataModel,
    columns: Vec<Arc<ColumnModel>>,
    by_name: HashMap<String, usize>,
    selection: Vec<Arc<dyn SelectionModel>>,
    children: OnceLock<ChildRows>,
    plugin: OnceLock<Arc<dyn TablePlugin>>,
    host: Arc<dyn BindingHost>,
    tasks: Arc<dyn TaskQueue>,
    context: BindingContext,
    alias: Option<String>,
    server_side: bool,
    on_create_row: Option<CreateRowHook>,
    on_destroy_table: Mutex<Option<DestroyTableHook>>,
    resize: Option<Observable<ResizeState>>,
    state: Mutex<GridState>,
    bindings: Mutex<CellBindings>,
    row_contexts: Mutex<HashMap<RowId, BindingContext>>,
    realized: Mutex<HashMap<RowId, RealizedRow>>,
    snapshot: Mutex<Option<Vec<Row>>>,
    shown: Mutex<Vec<Row>>,
    pending: Mutex<Option<PendingRequest>>,
    queued: Mutex<Option<(ServerRequest, ServerCallback)>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

static_assertions::assert_impl_all!(GridShared: Send, Sync);

/// Bind `element` to a grid described by `settings`.
///
/// `context` is the binding context the element lives in; every row is scoped
/// as a child of it. Fails when the element is not a table, when columns must
/// be inferred but there is no data, when a child-row model has no template,
/// or when the plugin cannot be attached.
pub fn init(
    element: Arc<dyn Element>,
    settings: GridSettings,
    context: &BindingContext,
    environment: GridEnvironment,
) -> Result<GridHandle> {
    let tag = element.tag_name();
    if !tag.eq_ignore_ascii_case("table") {
        return Err(GridError::not_a_table(tag));
    }

    let _perf = PerfSpan::new("grid_init");
    let GridSettings {
        data_model,
        column_models,
        selection_models,
        children_models,
        mut options,
        order,
        alias,
        on_create_row,
        on_create_table,
        on_destroy_table,
        api,
        resize,
        templates,
        type_detector,
        column_ids,
        child_ids,
    } = settings;

    let data_model = data_model.into_model();
    let first_row = data_model.rows().get_at(0);

    let columns = match column_models {
        Some(inputs) => {
            let object_rows = first_row.as_ref().is_none_or(|row| !row.is_array());
            inputs
                .into_iter()
                .enumerate()
                .map(|(index, input)| {
                    ColumnModel::normalize(
                        input,
                        &ColumnEnv {
                            registry: &templates,
                            ids: &column_ids,
                            index,
                            object_rows,
                        },
                    )
                })
                .collect()
        }
        None => infer_columns(first_row.as_ref(), &type_detector, &templates, &column_ids)?,
    };

    let children = children_models
        .into_iter()
        .map(|input| input.into_model(&child_ids))
        .collect::<Result<Vec<_>>>()?;

    let explicit_order = order.is_some();
    let order = order.unwrap_or_else(|| default_order(&columns));
    let server_side = data_model.has_request_hook();

    options.complete(&columns, order.clone(), server_side);
    if !server_side {
        options.data = data_model.rows().get();
    }
    if let Some(hook) = on_create_table {
        hook(&mut options);
    }

    let columns: Vec<Arc<ColumnModel>> = columns.into_iter().map(Arc::new).collect();
    let by_name = columns
        .iter()
        .enumerate()
        .map(|(index, column)| (column.name().to_string(), index))
        .collect();

    let shared = Arc::new(GridShared {
        element: Arc::clone(&element),
        data_model,
        columns,
        by_name,
        selection: selection_models,
        children: OnceLock::new(),
        plugin: OnceLock::new(),
        host: Arc::clone(&environment.host),
        tasks: Arc::clone(&environment.tasks),
        context: context.clone(),
        alias,
        server_side,
        on_create_row,
        on_destroy_table: Mutex::new(on_destroy_table),
        resize,
        state: Mutex::new(GridState::Bound),
        bindings: Mutex::new(CellBindings::new()),
        row_contexts: Mutex::new(HashMap::new()),
        realized: Mutex::new(HashMap::new()),
        snapshot: Mutex::new(None),
        shown: Mutex::new(options.data.clone()),
        pending: Mutex::new(None),
        queued: Mutex::new(None),
        subscriptions: Mutex::new(Vec::new()),
    });

    tracing::debug!(
        target: targets::CONTROLLER,
        columns = shared.columns.len(),
        children = children.len(),
        server_side,
        "grid bound"
    );

    let plugin = environment
        .factory
        .attach(&element, &options, shared.callbacks())?;
    let installed = shared.plugin.set(Arc::clone(&plugin)).is_ok()
        && shared
            .children
            .set(ChildRows::new(
                children,
                Arc::clone(&plugin),
                Arc::clone(&environment.host),
                environment.animator.clone(),
            ))
            .is_ok();
    debug_assert!(installed, "plugin attached twice");
    *shared.state.lock() = GridState::Live;

    shared.subscribe(&plugin);
    shared.apply_initial_state(&plugin, explicit_order.then_some(order.as_slice()));

    let queued = shared.queued.lock().take();
    if let Some((request, callback)) = queued {
        shared.server_request(request, callback);
    }

    if let Some(hook) = api {
        hook(&plugin);
    }

    element.on_dispose(Box::new({
        let shared = Arc::clone(&shared);
        move || shared.dispose()
    }));

    tracing::debug!(target: targets::CONTROLLER, "grid live");
    Ok(GridHandle { shared })
}

impl GridShared {
    fn state(&self) -> GridState {
        *self.state.lock()
    }

    fn is_disposed(&self) -> bool {
        self.state() == GridState::Disposed
    }

    fn plugin(&self) -> Option<&Arc<dyn TablePlugin>> {
        self.plugin.get()
    }

    fn callbacks(self: &Arc<Self>) -> TableCallbacks {
        let weak = Arc::downgrade(self);

        let server_request: Option<ServerRequestHandler> = self.server_side.then(|| {
            let weak = weak.clone();
            Arc::new(move |request: ServerRequest, callback: ServerCallback| {
                if let Some(grid) = weak.upgrade() {
                    grid.server_request(request, callback);
                }
            }) as ServerRequestHandler
        });

        TableCallbacks {
            row_created: Arc::new({
                let weak = weak.clone();
                move |row: &Row, node: &Arc<dyn Element>, cells: &CellNodes| {
                    if let Some(grid) = weak.upgrade() {
                        grid.row_created(row, node, cells);
                    }
                }
            }),
            header_created: Arc::new({
                let weak = weak.clone();
                move |cells: &CellNodes| {
                    if let Some(grid) = weak.upgrade() {
                        grid.bind_header(cells);
                    }
                }
            }),
            footer_created: Arc::new(move |cells: &CellNodes| {
                if let Some(grid) = weak.upgrade() {
                    grid.bind_footer(cells);
                }
            }),
            server_request,
        }
    }

    fn subscribe(self: &Arc<Self>, plugin: &Arc<dyn TablePlugin>) {
        let mut subscriptions = Vec::new();
        let rows = self.data_model.rows();

        subscriptions.push(rows.subscribe_before({
            let weak = Arc::downgrade(self);
            move |old| {
                if let Some(grid) = weak.upgrade() {
                    grid.rows_changing(old);
                }
            }
        }));
        subscriptions.push(rows.subscribe({
            let weak = Arc::downgrade(self);
            move |new| {
                if let Some(grid) = weak.upgrade() {
                    grid.rows_changed(new);
                }
            }
        }));

        for column in &self.columns {
            let weak = Arc::downgrade(self);
            let index = column.index();
            subscriptions.push(column.visible().subscribe(move |visible| {
                if let Some(grid) = weak.upgrade() {
                    grid.apply_visibility(index, *visible);
                }
            }));
        }

        if let (Some(state), Some(responsive)) = (self.resize.clone(), plugin.responsive()) {
            let weak = Arc::downgrade(self);
            let names: Vec<String> = self.columns.iter().map(|column| column.name().to_string()).collect();
            responsive.on_resize(Box::new(move |hidden: &[bool]| {
                state.set(ResizeState {
                    columns: names.clone(),
                    hidden_columns: hidden.to_vec(),
                });
                let Some(grid) = weak.upgrade() else {
                    return;
                };
                let weak = weak.clone();
                grid.tasks.post(Box::new(move || {
                    if let Some(grid) = weak.upgrade() {
                        grid.rebind_all();
                    }
                }));
            }));
        }

        *self.subscriptions.lock() = subscriptions;
    }

    fn apply_initial_state(&self, plugin: &Arc<dyn TablePlugin>, order: Option<&[OrderEntry]>) {
        for column in &self.columns {
            self.apply_visibility(column.index(), column.visible().get());
        }
        if let Some(order) = order {
            plugin.order(order);
        }
    }

    fn apply_visibility(&self, index: usize, visible: bool) {
        if self.is_disposed() {
            return;
        }
        let Some(plugin) = self.plugin() else {
            return;
        };
        plugin.set_column_visible(index, visible);
        if let Some(responsive) = plugin.responsive() {
            responsive.set_ignore_column(index, !visible);
        }
    }

    /// The scope a row's cells and child rows are bound under.
    fn row_context(&self, row: &Row) -> BindingContext {
        self.row_contexts
            .lock()
            .entry(row.id())
            .or_insert_with(|| {
                self.context
                    .child(ContextData::Row(row.clone()), self.alias.as_deref())
            })
            .clone()
    }

    fn row_created(&self, row: &Row, node: &Arc<dyn Element>, cells: &CellNodes) {
        if self.is_disposed() {
            return;
        }

        self.data_model.map_row(row);
        let context = self.row_context(row);
        for (index, cell) in cells.iter().enumerate() {
            if let (Some(cell), Some(column)) = (cell, self.columns.get(index)) {
                self.bind_cell(CellKey::data(row.id(), index), cell, column.template(), &context);
            }
        }

        let previous = self.realized.lock().insert(
            row.id(),
            RealizedRow {
                row: row.clone(),
                node: Arc::clone(node),
            },
        );
        if previous.is_some_and(|previous| same_node(&previous.node, node)) {
            return;
        }

        if let Some(hook) = &self.on_create_row {
            hook(row, node);
        }
        for model in &self.selection {
            Arc::clone(model).on_register(row, node);
        }
    }

    fn bind_header(&self, cells: &CellNodes) {
        for (index, cell) in cells.iter().enumerate() {
            if let (Some(cell), Some(column)) = (cell, self.columns.get(index)) {
                let context = self.context.child(ContextData::Column(Arc::clone(column)), None);
                self.bind_cell(CellKey::header(index), cell, column.header(), &context);
            }
        }
    }

    fn bind_footer(&self, cells: &CellNodes) {
        for (index, cell) in cells.iter().enumerate() {
            if let (Some(cell), Some(column)) = (cell, self.columns.get(index)) {
                if column.footer().is_empty() {
                    continue;
                }
                let context = self.context.child(ContextData::Column(Arc::clone(column)), None);
                self.bind_cell(CellKey::footer(index), cell, column.footer(), &context);
            }
        }
    }

    fn bind_cell(&self, key: CellKey, node: &Arc<dyn Element>, template: &str, context: &BindingContext) {
        if self.bindings.lock().claim(key, node).is_none() {
            return;
        }
        if let Err(error) = self.host.render_template(template, context, node) {
            self.bindings.lock().release(&key);
            tracing::warn!(
                target: targets::CONTROLLER,
                %error,
                column = key.column,
                "cell binding failed"
            );
        }
    }

    /// Clean and rebind every header cell.
    fn rebind_header(&self, plugin: &Arc<dyn TablePlugin>) {
        let stale = self.bindings.lock().clear_section(CellSection::Header);
        for node in &stale {
            self.host.clean_node(node);
        }
        self.bind_header(&plugin.header_cells());
    }

    /// Bind every realized cell that is not bound yet.
    fn rebind_all(&self) {
        if self.state() != GridState::Live {
            return;
        }
        let Some(plugin) = self.plugin().cloned() else {
            return;
        };

        let _perf = PerfSpan::new("grid_rebind");
        self.bind_header(&plugin.header_cells());
        self.bind_footer(&plugin.footer_cells());
        for row in plugin.rows() {
            if let Some((node, cells)) = plugin.row_nodes(&row) {
                self.row_created(&row, &node, &cells);
            }
        }
    }

    fn live_children(&self) -> Result<&ChildRows> {
        if self.state() != GridState::Live {
            return Err(GridError::Disposed);
        }
        self.children.get().ok_or(GridError::Disposed)
    }

    fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if *state == GridState::Disposed {
                return;
            }
            *state = GridState::Disposed;
        }

        let _perf = PerfSpan::new("grid_dispose");
        drop(std::mem::take(&mut *self.subscriptions.lock()));

        if let Some(children) = self.children.get() {
            children.clear();
        }

        let realized = std::mem::take(&mut *self.realized.lock());
        for entry in realized.values() {
            for model in &self.selection {
                model.on_unregister(&entry.row);
            }
        }

        let nodes = self.bindings.lock().clear();
        for node in &nodes {
            self.host.clean_node(node);
        }
        self.row_contexts.lock().clear();
        self.data_model.forget_all();
        drop(self.pending.lock().take());
        drop(self.queued.lock().take());

        if let Some(plugin) = self.plugin() {
            plugin.destroy();
        }
        let hook = self.on_destroy_table.lock().take();
        if let Some(hook) = hook {
            hook();
        }

        tracing::debug!(
            target: targets::CONTROLLER,
            element = %self.element.tag_name(),
            "grid disposed"
        );
    }
}

/// A live grid.
///
/// Cloning produces another handle to the same grid. Dropping every handle
/// does not dispose the grid; the element's disposal does.
#[derive(Clone)]
pub struct GridHandle {
    shared: Arc<GridShared>,
}

impl GridHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> GridState {
        self.shared.state()
    }

    /// The grid's data model.
    pub fn data_model(&self) -> &DataModel {
        &self.shared.data_model
    }

    /// Normalized columns, in column order.
    pub fn columns(&self) -> &[Arc<ColumnModel>] {
        &self.shared.columns
    }

    /// Column named `name`.
    pub fn column(&self, name: &str) -> Option<&Arc<ColumnModel>> {
        self.shared
            .by_name
            .get(name)
            .and_then(|&index| self.shared.columns.get(index))
    }

    /// The attached table plugin.
    pub fn plugin(&self) -> Option<Arc<dyn TablePlugin>> {
        self.shared.plugin().cloned()
    }

    /// Returns `true` if the table is paged on the server.
    pub fn is_server_side(&self) -> bool {
        self.shared.server_side
    }

    /// Number of cells currently bound.
    pub fn bound_cells(&self) -> usize {
        self.shared.bindings.lock().len()
    }

    /// Expand `row`'s child rows.
    pub fn show_children(&self, row: &Row) -> Result<bool> {
        let children = self.shared.live_children()?;
        children.show(row, &self.shared.row_context(row))
    }

    /// Collapse `row`'s child rows.
    pub fn hide_children(&self, row: &Row) -> Result<bool> {
        Ok(self.shared.live_children()?.hide(row))
    }

    /// Expand or collapse `row`'s child rows.
    pub fn toggle_children(&self, row: &Row) -> Result<ChildRowState> {
        let children = self.shared.live_children()?;
        children.toggle(row, &self.shared.row_context(row))
    }

    /// State of `row`'s child rows.
    pub fn child_state(&self, row: &Row) -> ChildRowState {
        self.shared
            .children
            .get()
            .map(|children| children.state(row))
            .unwrap_or_default()
    }

    /// Bind every realized cell that is not bound yet.
    pub fn rebind(&self) -> Result<()> {
        if self.state() != GridState::Live {
            return Err(GridError::Disposed);
        }
        self.shared.rebind_all();
        Ok(())
    }

    /// Tear the grid down. Does nothing when already disposed.
    pub fn dispose(&self) {
        self.shared.dispose();
    }

    /// The grid binds its own descendants; the host must not bind them again.
    pub fn controls_descendant_bindings(&self) -> bool {
        true
    }
}

impl fmt::Debug for GridHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHandle")
            .field("state", &self.state())
            .field("columns", &self.shared.columns.len())
            .field("server_side", &self.shared.server_side)
            .finish_non_exhaustive()
    }
}
