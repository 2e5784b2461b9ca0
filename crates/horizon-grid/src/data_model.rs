//! The grid's data model.
//!
//! A [`DataModel`] owns the observable row collection and the observable query
//! parameters (`start`, `count`, `search`, `order`, `filters`). When a request
//! hook is configured, any change to a query parameter issues a
//! [`refresh`](DataModel::refresh): the hook receives a [`QueryParams`]
//! snapshot and a [`RequestCompletion`], and a successful completion replaces
//! the row collection wholesale.
//!
//! Rows are mapped lazily, the first time the grid realizes them: every field
//! becomes an individually observable cell, and the configured cell hooks are
//! subscribed to those cells.
//!
//! # Example
//!
//! ```
//! use horizon_grid::{DataModel, Row};
//! use horizon_grid_core::Observable;
//! use serde_json::json;
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let requests = Arc::new(Mutex::new(Vec::new()));
//! let seen = requests.clone();
//!
//! let count = Observable::new(2usize);
//! let model = DataModel::builder()
//!     .count(count.clone())
//!     .on_request(move |params, done| {
//!         seen.lock().push(params.count);
//!         done.complete(vec![Row::try_from(json!({"id": 1})).unwrap()]);
//!     })
//!     .build();
//!
//! count.set(3);
//! assert_eq!(*requests.lock(), vec![3]);
//! assert_eq!(model.rows().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Observable, ObservableVec, Signal, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GridError, Result};
use crate::row::{Row, RowId};

/// Snapshot of the query parameters handed to a request hook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    /// Offset of the first requested row.
    pub start: usize,
    /// Number of rows requested.
    pub count: usize,
    /// Free-text search.
    pub search: String,
    /// Sort descriptor: column name to `{direction, type}`.
    pub order: Value,
    /// Active per-column filters.
    pub filters: Value,
    /// Whether the request should be sent as a JSON body.
    pub usejson: bool,
}

impl QueryParams {
    /// The parameters as a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "start": self.start,
            "count": self.count,
            "search": self.search,
            "order": self.order,
            "filters": self.filters,
        })
    }
}

/// Loadable defaults for a data model's query parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataModelOptions {
    /// Offset of the first row.
    pub start: usize,
    /// Page size.
    pub count: usize,
    /// Free-text search.
    pub search: String,
    /// Sort descriptor.
    pub order: Value,
    /// Per-column filters.
    pub filters: Value,
    /// Send requests as JSON.
    pub usejson: bool,
}

impl Default for DataModelOptions {
    fn default() -> Self {
        Self {
            start: 0,
            count: 20,
            search: String::new(),
            order: Value::Object(Map::new()),
            filters: Value::Array(Vec::new()),
            usejson: false,
        }
    }
}

/// A cell notification: the owning row, the column key, the cell and a value.
///
/// For change notifications `value` is the new value; for before-change
/// notifications it is the value about to be replaced.
#[derive(Debug, Clone)]
pub struct CellEvent {
    /// The owning row.
    pub row: Row,
    /// The field key.
    pub column: String,
    /// The cell's observable.
    pub cell: Observable<Value>,
    /// The relevant value.
    pub value: Value,
}

/// Hook issuing a data request.
pub type RequestHook = Arc<dyn Fn(QueryParams, RequestCompletion) + Send + Sync>;

/// Hook receiving a row.
pub type RowHook = Arc<dyn Fn(&Row) + Send + Sync>;

/// Hook receiving a cell notification.
pub type CellHook = Arc<dyn Fn(&CellEvent) + Send + Sync>;

#[derive(Default, Clone)]
struct DataModelHooks {
    request: Option<RequestHook>,
    add_row: Option<RowHook>,
    add_cell: Option<CellHook>,
    change: Option<CellHook>,
    before: Option<CellHook>,
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    dirty: bool,
}

struct DataModelInner {
    rows: ObservableVec<Row>,
    start: Observable<usize>,
    count: Observable<usize>,
    search: Observable<String>,
    order: Observable<Value>,
    filters: Observable<Value>,
    usejson: bool,
    server_total: Observable<Option<usize>>,
    hooks: DataModelHooks,
    request_failed: Arc<Signal<GridError>>,
    mapped: Mutex<HashMap<RowId, Vec<Subscription>>>,
    batch: Mutex<BatchState>,
    param_subscriptions: Mutex<Vec<Subscription>>,
}

/// Observable rows plus observable query parameters.
///
/// Cloning produces another handle to the same model.
#[derive(Clone)]
pub struct DataModel {
    inner: Arc<DataModelInner>,
}

impl DataModel {
    /// A model over `rows` with default query parameters and no hooks.
    pub fn new(rows: Vec<Row>) -> Self {
        Self::builder().rows(rows).build()
    }

    /// A model with the given query defaults and no rows.
    pub fn from_options(options: DataModelOptions) -> Self {
        Self::builder().options(options).build()
    }

    /// Start building a model.
    pub fn builder() -> DataModelBuilder {
        DataModelBuilder::default()
    }

    /// The observable row collection.
    pub fn rows(&self) -> &ObservableVec<Row> {
        &self.inner.rows
    }

    /// Paging offset.
    pub fn start(&self) -> &Observable<usize> {
        &self.inner.start
    }

    /// Page size.
    pub fn count(&self) -> &Observable<usize> {
        &self.inner.count
    }

    /// Free-text search.
    pub fn search(&self) -> &Observable<String> {
        &self.inner.search
    }

    /// Sort descriptor.
    pub fn order(&self) -> &Observable<Value> {
        &self.inner.order
    }

    /// Per-column filters.
    pub fn filters(&self) -> &Observable<Value> {
        &self.inner.filters
    }

    /// Total records on the server, when the request hook reported it.
    pub fn server_total(&self) -> &Observable<Option<usize>> {
        &self.inner.server_total
    }

    /// Whether requests should be sent as JSON.
    pub fn usejson(&self) -> bool {
        self.inner.usejson
    }

    /// Returns `true` if a request hook is configured (server mode).
    pub fn has_request_hook(&self) -> bool {
        self.inner.hooks.request.is_some()
    }

    /// Snapshot of the current query parameters.
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            start: self.inner.start.get(),
            count: self.inner.count.get(),
            search: self.inner.search.get(),
            order: self.inner.order.get(),
            filters: self.inner.filters.get(),
            usejson: self.inner.usejson,
        }
    }

    /// Issue a request through the request hook; a no-op without one.
    pub fn refresh(&self) {
        let Some(hook) = self.inner.hooks.request.clone() else {
            return;
        };

        let params = self.query_params();
        tracing::debug!(
            target: targets::DATA,
            start = params.start,
            count = params.count,
            search = %params.search,
            "requesting rows"
        );
        hook(
            params,
            RequestCompletion {
                model: Arc::downgrade(&self.inner),
            },
        );
    }

    /// Run `f`, coalescing query-parameter changes made inside it into at most
    /// one refresh, issued when `f` returns.
    ///
    /// Returns `true` if a parameter changed (and a refresh was issued when a
    /// request hook exists).
    pub fn batch<F: FnOnce()>(&self, f: F) -> bool {
        self.inner.batch.lock().depth += 1;
        f();
        let dirty = {
            let mut batch = self.inner.batch.lock();
            batch.depth -= 1;
            if batch.depth == 0 {
                std::mem::take(&mut batch.dirty)
            } else {
                false
            }
        };
        if dirty {
            self.refresh();
        }
        dirty
    }

    fn param_changed(&self) {
        {
            let mut batch = self.inner.batch.lock();
            if batch.depth > 0 {
                batch.dirty = true;
                return;
            }
        }
        self.refresh();
    }

    /// Make every field of `row` observable and attach the cell hooks.
    ///
    /// Mapping a row twice does nothing the second time.
    pub fn map_row(&self, row: &Row) {
        {
            let mut mapped = self.inner.mapped.lock();
            if mapped.contains_key(&row.id()) {
                return;
            }
            mapped.insert(row.id(), Vec::new());
        }

        let hooks = &self.inner.hooks;
        let mut subscriptions = Vec::new();

        for (key, cell) in row.observe_fields() {
            if let Some(hook) = &hooks.before {
                subscriptions.push(cell.subscribe_before(cell_listener(hook, row, &key, &cell)));
            }
            if let Some(hook) = &hooks.change {
                subscriptions.push(cell.subscribe(cell_listener(hook, row, &key, &cell)));
            }
            if let Some(hook) = &hooks.add_cell {
                let value = cell.get();
                hook(&CellEvent {
                    row: row.clone(),
                    column: key,
                    cell,
                    value,
                });
            }
        }

        if let Some(hook) = &hooks.add_row {
            hook(row);
        }

        if let Some(slot) = self.inner.mapped.lock().get_mut(&row.id()) {
            slot.extend(subscriptions);
        }
    }

    /// Returns `true` if this model has mapped `row`.
    pub fn is_mapped(&self, row: &Row) -> bool {
        self.inner.mapped.lock().contains_key(&row.id())
    }

    /// Detach the cell hooks of a departed row.
    pub fn forget(&self, row: &Row) {
        let removed = self.inner.mapped.lock().remove(&row.id());
        drop(removed);
    }

    /// Detach the cell hooks of every row.
    pub fn forget_all(&self) {
        let removed = std::mem::take(&mut *self.inner.mapped.lock());
        drop(removed);
    }

    /// Subscribe to failed requests.
    pub fn on_request_failed<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&GridError) + Send + Sync + 'static,
    {
        self.inner.request_failed.subscribe(slot)
    }

    fn finish_request(&self, result: Result<Vec<Row>>) {
        match result {
            Ok(rows) => {
                tracing::debug!(target: targets::DATA, rows = rows.len(), "request completed");
                if !self.inner.rows.replace_all(rows) {
                    self.inner.rows.notify();
                }
            }
            Err(error) => {
                tracing::warn!(
                    target: targets::DATA,
                    %error,
                    "request failed, keeping current rows"
                );
                self.inner.request_failed.emit(error);
            }
        }
    }
}

fn cell_listener(
    hook: &CellHook,
    row: &Row,
    key: &str,
    cell: &Observable<Value>,
) -> impl Fn(&Value) + Send + Sync + 'static {
    let hook = Arc::clone(hook);
    let row = row.clone();
    let key = key.to_string();
    let cell = cell.clone();
    move |value| {
        hook(&CellEvent {
            row: row.clone(),
            column: key.clone(),
            cell: cell.clone(),
            value: value.clone(),
        })
    }
}

impl fmt::Debug for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataModel")
            .field("rows", &self.inner.rows.len())
            .field("params", &self.query_params())
            .field("server", &self.has_request_hook())
            .finish()
    }
}

/// One-shot completion handed to a request hook.
///
/// Completing with rows replaces the model's row collection; failing keeps
/// the current rows, logs the error and publishes it to
/// [`DataModel::on_request_failed`] subscribers. Dropping the completion
/// without calling it leaves the model untouched.
pub struct RequestCompletion {
    model: Weak<DataModelInner>,
}

impl RequestCompletion {
    /// Finish with an error-first result. A page finished this way carries
    /// no server total.
    pub fn finish(self, result: Result<Vec<Row>>) {
        self.settle(result, None);
    }

    /// Finish with a page of rows.
    pub fn complete(self, rows: Vec<Row>) {
        self.settle(Ok(rows), None);
    }

    /// Finish with a page of rows and the server's total record count.
    pub fn complete_with_total(self, rows: Vec<Row>, total: usize) {
        self.settle(Ok(rows), Some(total));
    }

    fn settle(self, result: Result<Vec<Row>>, total: Option<usize>) {
        let Some(inner) = self.model.upgrade() else {
            return;
        };
        // a failed request keeps the previous page and its total
        if result.is_ok() {
            inner.server_total.set(total);
        }
        DataModel { inner }.finish_request(result);
    }

    /// Finish with an error.
    pub fn fail(self, error: GridError) {
        self.finish(Err(error));
    }
}

impl fmt::Debug for RequestCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCompletion")
            .field("live", &(self.model.strong_count() > 0))
            .finish()
    }
}

/// Builder for [`DataModel`].
#[derive(Default)]
pub struct DataModelBuilder {
    rows: Option<ObservableVec<Row>>,
    options: DataModelOptions,
    start: Option<Observable<usize>>,
    count: Option<Observable<usize>>,
    search: Option<Observable<String>>,
    order: Option<Observable<Value>>,
    filters: Option<Observable<Value>>,
    hooks: DataModelHooks,
}

impl DataModelBuilder {
    /// Initial rows; wrapped in a new observable collection.
    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = Some(ObservableVec::new(rows));
        self
    }

    /// Share an existing observable row collection.
    pub fn observable_rows(mut self, rows: ObservableVec<Row>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Query defaults for parameters not given as observables.
    pub fn options(mut self, options: DataModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing paging-offset observable.
    pub fn start(mut self, start: Observable<usize>) -> Self {
        self.start = Some(start);
        self
    }

    /// Share an existing page-size observable.
    pub fn count(mut self, count: Observable<usize>) -> Self {
        self.count = Some(count);
        self
    }

    /// Share an existing search observable.
    pub fn search(mut self, search: Observable<String>) -> Self {
        self.search = Some(search);
        self
    }

    /// Share an existing sort-descriptor observable.
    pub fn order(mut self, order: Observable<Value>) -> Self {
        self.order = Some(order);
        self
    }

    /// Share an existing filter observable.
    pub fn filters(mut self, filters: Observable<Value>) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Hook that fetches rows for the current query parameters.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(QueryParams, RequestCompletion) + Send + Sync + 'static,
    {
        self.hooks.request = Some(Arc::new(hook));
        self
    }

    /// Hook run once per row after all its fields are observable.
    pub fn on_add_row<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.hooks.add_row = Some(Arc::new(hook));
        self
    }

    /// Hook run once per field when a row is mapped.
    pub fn on_add_cell<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CellEvent) + Send + Sync + 'static,
    {
        self.hooks.add_cell = Some(Arc::new(hook));
        self
    }

    /// Hook run after every cell value change.
    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CellEvent) + Send + Sync + 'static,
    {
        self.hooks.change = Some(Arc::new(hook));
        self
    }

    /// Hook run before every cell value change.
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CellEvent) + Send + Sync + 'static,
    {
        self.hooks.before = Some(Arc::new(hook));
        self
    }

    /// Build the model.
    pub fn build(self) -> DataModel {
        let options = self.options;
        let inner = Arc::new(DataModelInner {
            rows: self.rows.unwrap_or_default(),
            start: self.start.unwrap_or_else(|| Observable::new(options.start)),
            count: self.count.unwrap_or_else(|| Observable::new(options.count)),
            search: self.search.unwrap_or_else(|| Observable::new(options.search)),
            order: self.order.unwrap_or_else(|| Observable::new(options.order)),
            filters: self.filters.unwrap_or_else(|| Observable::new(options.filters)),
            usejson: options.usejson,
            server_total: Observable::new(None),
            hooks: self.hooks,
            request_failed: Arc::new(Signal::new()),
            mapped: Mutex::new(HashMap::new()),
            batch: Mutex::new(BatchState::default()),
            param_subscriptions: Mutex::new(Vec::new()),
        });

        if inner.hooks.request.is_some() {
            let weak = Arc::downgrade(&inner);
            let subscriptions = vec![
                inner.start.subscribe(refresh_on_change(&weak)),
                inner.count.subscribe(refresh_on_change(&weak)),
                inner.search.subscribe(refresh_on_change(&weak)),
                inner.order.subscribe(refresh_on_change(&weak)),
                inner.filters.subscribe(refresh_on_change(&weak)),
            ];
            *inner.param_subscriptions.lock() = subscriptions;
        }

        DataModel { inner }
    }
}

fn refresh_on_change<T: 'static>(
    model: &Weak<DataModelInner>,
) -> impl Fn(&T) + Send + Sync + 'static {
    let model = model.clone();
    move |_| {
        if let Some(inner) = model.upgrade() {
            DataModel { inner }.param_changed();
        }
    }
}

/// Anything a grid accepts as its data model.
#[derive(Debug, Clone)]
pub enum DataModelInput {
    /// An existing model.
    Model(DataModel),
    /// Query defaults for a new, empty model.
    Options(DataModelOptions),
    /// Plain rows for a new model.
    Rows(Vec<Row>),
}

impl DataModelInput {
    /// The model, constructing one when needed.
    pub fn into_model(self) -> DataModel {
        match self {
            Self::Model(model) => model,
            Self::Options(options) => DataModel::from_options(options),
            Self::Rows(rows) => DataModel::new(rows),
        }
    }
}

impl From<DataModel> for DataModelInput {
    fn from(model: DataModel) -> Self {
        Self::Model(model)
    }
}

impl From<DataModelOptions> for DataModelInput {
    fn from(options: DataModelOptions) -> Self {
        Self::Options(options)
    }
}

impl From<Vec<Row>> for DataModelInput {
    fn from(rows: Vec<Row>) -> Self {
        Self::Rows(rows)
    }
}
