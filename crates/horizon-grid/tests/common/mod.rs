//! In-memory host used by the integration tests.
//!
//! `FakeNode` stands in for DOM nodes, `RecordingHost` for the binding engine
//! and `FakePlugin` for the table widget. The plugin realizes rows the way a
//! real widget does: header and footer on attach, body rows on draw, a fresh
//! set of nodes for every server page.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use horizon_grid::host::{
    Animation, Animator, BindingContext, BindingHost, CellNodes, ClickEvent, ClickHandler,
    ContextData, DisposeHandler, Done, Element, ResponsiveColumns, ServerPage, ServerRequest,
    TableCallbacks, TableFactory, TablePlugin,
};
use horizon_grid::{
    GridEnvironment, GridError, GridHandle, GridSettings, OrderEntry, Result, Row, TableOptions,
};
use horizon_grid_core::DeferredTaskQueue;
use parking_lot::Mutex;
use serde_json::{Value, json};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Rows from a JSON array of objects or arrays.
pub fn rows(values: Value) -> Vec<Row> {
    match values {
        Value::Array(items) => items
            .into_iter()
            .map(|item| Row::try_from(item).unwrap())
            .collect(),
        other => panic!("expected an array, got {other}"),
    }
}

pub fn row(value: Value) -> Row {
    Row::try_from(value).unwrap()
}

// ============================================================================
// Nodes
// ============================================================================

pub struct FakeNode {
    tag: String,
    classes: Mutex<Vec<String>>,
    styles: Mutex<HashMap<String, String>>,
    clicks: Mutex<Vec<ClickHandler>>,
    disposers: Mutex<Vec<DisposeHandler>>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
            classes: Mutex::new(Vec::new()),
            styles: Mutex::new(HashMap::new()),
            clicks: Mutex::new(Vec::new()),
            disposers: Mutex::new(Vec::new()),
        })
    }

    pub fn click(&self, event: ClickEvent) {
        for handler in self.clicks.lock().iter() {
            handler(&event);
        }
    }

    pub fn click_handlers(&self) -> usize {
        self.clicks.lock().len()
    }

    /// Remove the node from the document.
    pub fn dispose(&self) {
        let handlers = std::mem::take(&mut *self.disposers.lock());
        for handler in handlers {
            handler();
        }
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.lock().get(property).cloned()
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.lock().clone()
    }
}

impl Element for FakeNode {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn add_class(&self, class: &str) {
        let mut classes = self.classes.lock();
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.classes.lock().retain(|existing| existing != class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.lock().iter().any(|existing| existing == class)
    }

    fn set_style(&self, property: &str, value: Option<&str>) {
        let mut styles = self.styles.lock();
        match value {
            Some(value) => {
                styles.insert(property.to_string(), value.to_string());
            }
            None => {
                styles.remove(property);
            }
        }
    }

    fn on_click(&self, handler: ClickHandler) {
        self.clicks.lock().push(handler);
    }

    fn on_dispose(&self, handler: DisposeHandler) {
        self.disposers.lock().push(handler);
    }
}

fn as_cells(cells: &[Option<Arc<FakeNode>>]) -> CellNodes {
    cells
        .iter()
        .map(|cell| cell.clone().map(|node| node as Arc<dyn Element>))
        .collect()
}

// ============================================================================
// Binding host
// ============================================================================

#[derive(Debug, Clone)]
pub struct Render {
    pub template: String,
    pub row: Option<Row>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Applied {
    pub alias: Option<String>,
    pub data: ContextData,
    pub row: Option<Row>,
}

#[derive(Default)]
pub struct RecordingHost {
    pub renders: Mutex<Vec<Render>>,
    pub applied: Mutex<Vec<Applied>>,
    pub cleaned: AtomicUsize,
    fail_on: Mutex<Option<String>>,
}

impl RecordingHost {
    pub fn fail_on(&self, template: &str) {
        *self.fail_on.lock() = Some(template.to_string());
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().len()
    }

    pub fn renders_of(&self, template: &str) -> usize {
        self.renders
            .lock()
            .iter()
            .filter(|render| render.template == template)
            .count()
    }

    pub fn cleaned(&self) -> usize {
        self.cleaned.load(Ordering::SeqCst)
    }
}

impl BindingHost for RecordingHost {
    fn render_template(
        &self,
        template: &str,
        context: &BindingContext,
        _target: &Arc<dyn Element>,
    ) -> Result<()> {
        if self.fail_on.lock().as_deref() == Some(template) {
            return Err(GridError::host(format!("cannot render {template}")));
        }
        self.renders.lock().push(Render {
            template: template.to_string(),
            row: context.row().cloned(),
            alias: context.alias().map(str::to_string),
        });
        Ok(())
    }

    fn apply_bindings(&self, context: &BindingContext, _target: &Arc<dyn Element>) -> Result<()> {
        self.applied.lock().push(Applied {
            alias: context.alias().map(str::to_string),
            data: context.data().clone(),
            row: context.row().cloned(),
        });
        Ok(())
    }

    fn clean_node(&self, _target: &Arc<dyn Element>) {
        self.cleaned.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Responsive capability
// ============================================================================

#[derive(Default)]
pub struct FakeResponsive {
    pub ignored: Mutex<HashMap<usize, bool>>,
    callbacks: Mutex<Vec<Box<dyn Fn(&[bool]) + Send + Sync>>>,
}

impl FakeResponsive {
    pub fn fire(&self, hidden: &[bool]) {
        for callback in self.callbacks.lock().iter() {
            callback(hidden);
        }
    }
}

impl ResponsiveColumns for FakeResponsive {
    fn set_ignore_column(&self, index: usize, ignore: bool) {
        self.ignored.lock().insert(index, ignore);
    }

    fn on_resize(&self, callback: Box<dyn Fn(&[bool]) + Send + Sync>) {
        self.callbacks.lock().push(callback);
    }
}

// ============================================================================
// Table plugin
// ============================================================================

struct RealizedRow {
    node: Arc<FakeNode>,
    cells: Vec<Option<Arc<FakeNode>>>,
}

pub struct FakePlugin {
    this: Weak<FakePlugin>,
    callbacks: TableCallbacks,
    pub options: TableOptions,
    columns: usize,
    hidden: Mutex<HashSet<usize>>,
    rows: Mutex<Vec<Row>>,
    realized: Mutex<HashMap<u64, RealizedRow>>,
    header: Mutex<Vec<Option<Arc<FakeNode>>>>,
    footer: Mutex<Vec<Option<Arc<FakeNode>>>>,
    children: Mutex<HashMap<u64, Vec<Arc<FakeNode>>>>,
    pub log: Mutex<Vec<String>>,
    pub pages: Mutex<Vec<ServerPage>>,
    pub responsive: Option<Arc<FakeResponsive>>,
    draws: AtomicU64,
}

impl FakePlugin {
    fn new(
        options: &TableOptions,
        callbacks: TableCallbacks,
        hidden: Option<&[usize]>,
    ) -> Arc<Self> {
        let columns = options.columns.len();
        let responsive = hidden.is_some().then(|| Arc::new(FakeResponsive::default()));
        let hidden: HashSet<usize> = hidden.unwrap_or_default().iter().copied().collect();
        let header = (0..columns)
            .map(|index| (!hidden.contains(&index)).then(|| FakeNode::new("th")))
            .collect();
        let footer = (0..columns).map(|_| Some(FakeNode::new("th"))).collect();

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            callbacks,
            options: options.clone(),
            columns,
            hidden: Mutex::new(hidden),
            rows: Mutex::new(Vec::new()),
            realized: Mutex::new(HashMap::new()),
            header: Mutex::new(header),
            footer: Mutex::new(footer),
            children: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            pages: Mutex::new(Vec::new()),
            responsive,
            draws: AtomicU64::new(0),
        })
    }

    /// What a widget does right after construction.
    fn start(&self) {
        (self.callbacks.header_created)(&as_cells(&self.header.lock().clone()));
        (self.callbacks.footer_created)(&as_cells(&self.footer.lock().clone()));
        if self.options.server_side {
            self.request(0, self.options.page_length, "", self.options.order.clone(), &[]);
        } else {
            *self.rows.lock() = self.options.data.clone();
            self.realize_pending();
        }
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().push(entry.into());
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    /// Realize every row that has no nodes yet.
    fn realize_pending(&self) {
        let rows = self.rows.lock().clone();
        let hidden = self.hidden.lock().clone();
        let mut created = Vec::new();
        {
            let mut realized = self.realized.lock();
            for row in rows {
                let id = row.id().as_u64();
                if realized.contains_key(&id) {
                    continue;
                }
                let node = FakeNode::new("tr");
                let cells: Vec<Option<Arc<FakeNode>>> = (0..self.columns)
                    .map(|index| (!hidden.contains(&index)).then(|| FakeNode::new("td")))
                    .collect();
                created.push((row, Arc::clone(&node), as_cells(&cells)));
                realized.insert(id, RealizedRow { node, cells });
            }
        }
        for (row, node, cells) in created {
            let node: Arc<dyn Element> = node;
            (self.callbacks.row_created)(&row, &node, &cells);
        }
    }

    /// Issue a server request the way the widget does on paging, sorting or searching.
    pub fn request(
        &self,
        start: usize,
        length: usize,
        search: &str,
        order: Vec<OrderEntry>,
        column_searches: &[(&str, &str)],
    ) -> u64 {
        let draw = self.draws.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(handler) = self.callbacks.server_request.clone() else {
            panic!("request issued in client mode");
        };
        let columns = self
            .options
            .columns
            .iter()
            .map(|column| horizon_grid::host::ServerColumn {
                name: column.name.clone(),
                search_value: column_searches
                    .iter()
                    .find(|(name, _)| *name == column.name)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default(),
            })
            .collect();
        let this = self.this.clone();
        self.record(format!("request {draw}"));
        handler(
            ServerRequest {
                draw,
                start,
                length,
                search: search.to_string(),
                order,
                columns,
            },
            Box::new(move |page| {
                if let Some(plugin) = this.upgrade() {
                    plugin.receive_page(page);
                }
            }),
        );
        draw
    }

    fn receive_page(&self, page: ServerPage) {
        self.record(format!("page {}", page.draw));
        self.pages.lock().push(page.clone());
        self.realized.lock().clear();
        *self.rows.lock() = page.data;
        self.realize_pending();
    }

    pub fn row_node(&self, row: &Row) -> Option<Arc<FakeNode>> {
        self.realized
            .lock()
            .get(&row.id().as_u64())
            .map(|realized| Arc::clone(&realized.node))
    }

    pub fn displayed(&self) -> Vec<Row> {
        self.rows.lock().clone()
    }

    pub fn child_nodes(&self, row: &Row) -> Vec<Arc<FakeNode>> {
        self.children
            .lock()
            .get(&row.id().as_u64())
            .cloned()
            .unwrap_or_default()
    }

    /// Responsive widening: realize the cells of `column`, then report the resize.
    pub fn reveal_column(&self, column: usize) {
        self.hidden.lock().remove(&column);
        for realized in self.realized.lock().values_mut() {
            if let Some(cell) = realized.cells.get_mut(column) {
                cell.get_or_insert_with(|| FakeNode::new("td"));
            }
        }
        if let Some(cell) = self.header.lock().get_mut(column) {
            cell.get_or_insert_with(|| FakeNode::new("th"));
        }

        let hidden = self.hidden.lock().clone();
        let flags: Vec<bool> = (0..self.columns).map(|index| hidden.contains(&index)).collect();
        if let Some(responsive) = &self.responsive {
            responsive.fire(&flags);
        }
    }
}

impl TablePlugin for FakePlugin {
    fn add_rows(&self, rows: &[Row]) {
        self.record(format!("add {}", rows.len()));
        self.rows.lock().extend(rows.iter().cloned());
    }

    fn remove_rows(&self, rows: &[Row]) {
        self.record(format!("remove {}", rows.len()));
        self.rows.lock().retain(|row| !rows.contains(row));
        let mut realized = self.realized.lock();
        for row in rows {
            realized.remove(&row.id().as_u64());
        }
    }

    fn draw(&self) {
        self.record("draw");
        self.realize_pending();
    }

    fn draw_page(&self, page: ServerPage) {
        self.record("draw_page");
        self.receive_page(page);
    }

    fn set_column_visible(&self, index: usize, visible: bool) {
        self.record(format!("visible {index} {visible}"));
    }

    fn order(&self, order: &[OrderEntry]) {
        self.record(format!("order {order:?}"));
    }

    fn rows(&self) -> Vec<Row> {
        self.rows.lock().clone()
    }

    fn row_nodes(&self, row: &Row) -> Option<(Arc<dyn Element>, CellNodes)> {
        self.realized.lock().get(&row.id().as_u64()).map(|realized| {
            let node: Arc<dyn Element> = realized.node.clone();
            (node, as_cells(&realized.cells))
        })
    }

    fn header_cells(&self) -> CellNodes {
        as_cells(&self.header.lock())
    }

    fn footer_cells(&self) -> CellNodes {
        as_cells(&self.footer.lock())
    }

    fn show_child(&self, row: &Row, markup: &str) -> Result<Vec<Arc<dyn Element>>> {
        self.record("show_child");
        let count = markup.matches("grid-child-row").count();
        let nodes: Vec<Arc<FakeNode>> = (0..count).map(|_| FakeNode::new("div")).collect();
        if markup.contains("display:none") {
            for node in &nodes {
                node.set_style("display", Some("none"));
            }
        }
        self.children.lock().insert(row.id().as_u64(), nodes.clone());
        Ok(nodes.into_iter().map(|node| node as Arc<dyn Element>).collect())
    }

    fn hide_child(&self, row: &Row) {
        self.record("hide_child");
        self.children.lock().remove(&row.id().as_u64());
    }

    fn responsive(&self) -> Option<Arc<dyn ResponsiveColumns>> {
        self.responsive
            .clone()
            .map(|responsive| responsive as Arc<dyn ResponsiveColumns>)
    }

    fn destroy(&self) {
        self.record("destroy");
    }
}

#[derive(Default)]
pub struct FakeFactory {
    hidden_columns: Option<Vec<usize>>,
    fail: bool,
    plugin: Mutex<Option<Arc<FakePlugin>>>,
}

impl FakeFactory {
    pub fn plugin(&self) -> Arc<FakePlugin> {
        self.plugin.lock().clone().expect("plugin attached")
    }

    pub fn attached(&self) -> bool {
        self.plugin.lock().is_some()
    }
}

impl TableFactory for FakeFactory {
    fn attach(
        &self,
        _element: &Arc<dyn Element>,
        options: &TableOptions,
        callbacks: TableCallbacks,
    ) -> Result<Arc<dyn TablePlugin>> {
        if self.fail {
            return Err(GridError::host("widget unavailable"));
        }
        let plugin = FakePlugin::new(options, callbacks, self.hidden_columns.as_deref());
        *self.plugin.lock() = Some(Arc::clone(&plugin));
        plugin.start();
        Ok(plugin)
    }
}

// ============================================================================
// Animator
// ============================================================================

#[derive(Default)]
pub struct ManualAnimator {
    running: Mutex<Vec<(String, Done)>>,
}

impl ManualAnimator {
    pub fn running(&self) -> usize {
        self.running.lock().len()
    }

    /// Complete every running transition.
    pub fn finish_all(&self) -> Vec<String> {
        let running = std::mem::take(&mut *self.running.lock());
        running
            .into_iter()
            .map(|(kind, done)| {
                done();
                kind
            })
            .collect()
    }
}

impl Animator for ManualAnimator {
    fn reveal(&self, element: &Arc<dyn Element>, _animation: &Animation, done: Done) {
        element.set_style("display", None);
        self.running.lock().push(("reveal".to_string(), done));
    }

    fn conceal(&self, element: &Arc<dyn Element>, _animation: &Animation, done: Done) {
        element.set_style("display", Some("none"));
        self.running.lock().push(("conceal".to_string(), done));
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub struct Fixture {
    pub table: Arc<FakeNode>,
    pub host: Arc<RecordingHost>,
    pub factory: Arc<FakeFactory>,
    pub tasks: Arc<DeferredTaskQueue>,
    pub animator: Arc<ManualAnimator>,
    animated: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(FakeFactory::default(), false)
    }

    pub fn animated() -> Self {
        Self::build(FakeFactory::default(), true)
    }

    /// A plugin with a responsive capability that starts with `hidden` columns unrealized.
    pub fn responsive(hidden: &[usize]) -> Self {
        Self::build(
            FakeFactory {
                hidden_columns: Some(hidden.to_vec()),
                ..FakeFactory::default()
            },
            false,
        )
    }

    pub fn failing_factory() -> Self {
        Self::build(
            FakeFactory {
                fail: true,
                ..FakeFactory::default()
            },
            false,
        )
    }

    fn build(factory: FakeFactory, animated: bool) -> Self {
        init_tracing();
        Self {
            table: FakeNode::new("table"),
            host: Arc::new(RecordingHost::default()),
            factory: Arc::new(factory),
            tasks: Arc::new(DeferredTaskQueue::new()),
            animator: Arc::new(ManualAnimator::default()),
            animated,
        }
    }

    pub fn environment(&self) -> GridEnvironment {
        let environment = GridEnvironment::new(self.factory.clone(), self.host.clone())
            .with_tasks(self.tasks.clone());
        if self.animated {
            environment.with_animator(self.animator.clone())
        } else {
            environment
        }
    }

    pub fn context(&self) -> BindingContext {
        BindingContext::root(ContextData::Value(json!({"page": "grid"})))
    }

    pub fn init(&self, settings: GridSettings) -> Result<GridHandle> {
        let table: Arc<dyn Element> = self.table.clone();
        horizon_grid::init(table, settings, &self.context(), self.environment())
    }

    pub fn plugin(&self) -> Arc<FakePlugin> {
        self.factory.plugin()
    }
}
