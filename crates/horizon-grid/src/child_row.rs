//! Expandable per-row detail panels.
//!
//! A [`ChildRowModel`] describes one detail panel: its template, wrapped in a
//! fixed container, an optional [`Animation`] and lifecycle hooks. A grid owns
//! a [`ChildRows`] set that drives every configured panel of a row together
//! through the states `Hidden -> Showing -> Shown -> Hiding -> Hidden`.
//!
//! Showing realizes all panel templates into the row's detail area, binds
//! each panel under its own scope (the `before_show` hook may substitute the
//! bound data) and reveals it. Hiding conceals every panel and collapses the
//! detail area once the last panel is done.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use horizon_grid_core::IdGenerator;
use horizon_grid_core::logging::targets;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::host::{Animation, Animator, BindingContext, BindingHost, ContextData, Done, Element, TablePlugin};
use crate::markup::{Content, build_element};
use crate::row::{Row, RowId};
use crate::template::TemplateSource;

/// Class of the container every panel template is wrapped in.
pub const CHILD_ROW_CLASS: &str = "grid-child-row";

/// Hook run with the row whose panel is changing.
pub type ChildHook = Arc<dyn Fn(&Row) + Send + Sync>;

/// Pre-show hook; a returned value replaces the row as the panel's data.
pub type BeforeShowHook = Arc<dyn Fn(&Row) -> Option<Value> + Send + Sync>;

#[derive(Clone, Default)]
struct ChildRowHooks {
    before_show: Option<BeforeShowHook>,
    after_show: Option<ChildHook>,
    before_hide: Option<ChildHook>,
    after_hide: Option<ChildHook>,
}

/// Loadable child-row settings plus lifecycle hooks.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChildRowOptions {
    name: Option<String>,
    template: Option<TemplateSource>,
    animate: Option<Animation>,
    #[serde(skip)]
    hooks: ChildRowHooks,
}

impl ChildRowOptions {
    /// Options for a panel rendering `template`.
    pub fn new(template: impl Into<TemplateSource>) -> Self {
        Self {
            template: Some(template.into()),
            ..Self::default()
        }
    }

    /// Set the panel's unique name (its scope alias).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Animate showing and hiding.
    pub fn animate(mut self, animation: Animation) -> Self {
        self.animate = Some(animation);
        self
    }

    /// Run before the panel is bound; a returned value becomes its data.
    pub fn before_show<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) -> Option<Value> + Send + Sync + 'static,
    {
        self.hooks.before_show = Some(Arc::new(hook));
        self
    }

    /// Run once the panel is in view.
    pub fn after_show<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.hooks.after_show = Some(Arc::new(hook));
        self
    }

    /// Run before the panel starts hiding.
    pub fn before_hide<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.hooks.before_hide = Some(Arc::new(hook));
        self
    }

    /// Run once the panel is out of view.
    pub fn after_hide<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.hooks.after_hide = Some(Arc::new(hook));
        self
    }
}

impl From<&str> for ChildRowOptions {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for ChildRowOptions {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}

impl fmt::Debug for ChildRowOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRowOptions")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("animate", &self.animate)
            .finish_non_exhaustive()
    }
}

/// A normalized detail-panel description.
#[derive(Clone)]
pub struct ChildRowModel {
    name: String,
    template: String,
    animate: Option<Animation>,
    hooks: ChildRowHooks,
}

impl ChildRowModel {
    /// Build a panel from a template or options, naming it from `ids` when
    /// no name is given.
    ///
    /// Fails with [`GridError::MissingTemplate`] when no non-empty template is given.
    pub fn new(options: impl Into<ChildRowOptions>, ids: &IdGenerator) -> Result<Self> {
        let options = options.into();
        let name = options.name.unwrap_or_else(|| ids.next_id());

        let markup = options
            .template
            .filter(|source| !source.is_empty())
            .map(|source| source.resolve())
            .filter(|markup| !markup.trim().is_empty())
            .ok_or_else(|| GridError::missing_template(name.clone()))?;

        let template = match options.animate {
            Some(_) => build_element(
                "div",
                [("class", CHILD_ROW_CLASS), ("style", "display:none")],
                Content::Text(markup),
            ),
            None => build_element("div", [("class", CHILD_ROW_CLASS)], Content::Text(markup)),
        };

        Ok(Self {
            name,
            template,
            animate: options.animate,
            hooks: options.hooks,
        })
    }

    /// Unique name; also the alias the panel's data is scoped under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped template markup.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The panel's animation, if any.
    pub fn animation(&self) -> Option<&Animation> {
        self.animate.as_ref()
    }
}

impl fmt::Debug for ChildRowModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRowModel")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("animate", &self.animate)
            .finish_non_exhaustive()
    }
}

/// Anything a grid accepts as a child-row model.
#[derive(Debug, Clone)]
pub enum ChildRowInput {
    /// Options for a new model.
    Options(ChildRowOptions),
    /// An already built model.
    Model(Arc<ChildRowModel>),
}

impl ChildRowInput {
    /// The model, building it when needed.
    pub fn into_model(self, ids: &IdGenerator) -> Result<Arc<ChildRowModel>> {
        match self {
            Self::Options(options) => ChildRowModel::new(options, ids).map(Arc::new),
            Self::Model(model) => Ok(model),
        }
    }
}

impl From<&str> for ChildRowInput {
    fn from(template: &str) -> Self {
        Self::Options(template.into())
    }
}

impl From<ChildRowOptions> for ChildRowInput {
    fn from(options: ChildRowOptions) -> Self {
        Self::Options(options)
    }
}

impl From<ChildRowModel> for ChildRowInput {
    fn from(model: ChildRowModel) -> Self {
        Self::Model(Arc::new(model))
    }
}

impl From<Arc<ChildRowModel>> for ChildRowInput {
    fn from(model: Arc<ChildRowModel>) -> Self {
        Self::Model(model)
    }
}

/// Show/hide state of a row's panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChildRowState {
    /// Collapsed.
    #[default]
    Hidden,
    /// Panels are being revealed.
    Showing,
    /// Expanded.
    Shown,
    /// Panels are being concealed.
    Hiding,
}

#[derive(Default)]
struct RowChildren {
    state: ChildRowState,
    nodes: Vec<Arc<dyn Element>>,
}

type RowTable = Arc<Mutex<HashMap<RowId, RowChildren>>>;

/// Drives the child-row panels of every row of one grid.
pub struct ChildRows {
    models: Vec<Arc<ChildRowModel>>,
    plugin: Arc<dyn TablePlugin>,
    host: Arc<dyn BindingHost>,
    animator: Option<Arc<dyn Animator>>,
    rows: RowTable,
}

impl ChildRows {
    /// Panels `models`, realized through `plugin` and bound through `host`.
    pub fn new(
        models: Vec<Arc<ChildRowModel>>,
        plugin: Arc<dyn TablePlugin>,
        host: Arc<dyn BindingHost>,
        animator: Option<Arc<dyn Animator>>,
    ) -> Self {
        Self {
            models,
            plugin,
            host,
            animator,
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The configured panels.
    pub fn models(&self) -> &[Arc<ChildRowModel>] {
        &self.models
    }

    /// Current state of `row`'s panels.
    pub fn state(&self, row: &Row) -> ChildRowState {
        self.rows
            .lock()
            .get(&row.id())
            .map(|children| children.state)
            .unwrap_or_default()
    }

    /// Expand `row`'s panels, binding them under `context`.
    ///
    /// Returns `Ok(false)` without doing anything unless the panels are hidden.
    pub fn show(&self, row: &Row, context: &BindingContext) -> Result<bool> {
        {
            let mut rows = self.rows.lock();
            let children = rows.entry(row.id()).or_default();
            if children.state != ChildRowState::Hidden {
                return Ok(false);
            }
            children.state = ChildRowState::Showing;
        }

        let markup: String = self.models.iter().map(|model| model.template()).collect();
        let nodes = match self.plugin.show_child(row, &markup) {
            Ok(nodes) => nodes,
            Err(error) => {
                self.reset(row);
                return Err(error);
            }
        };
        if let Some(children) = self.rows.lock().get_mut(&row.id()) {
            children.nodes = nodes.clone();
        }

        let panels: Vec<(&Arc<ChildRowModel>, &Arc<dyn Element>)> =
            self.models.iter().zip(nodes.iter()).collect();

        for (model, node) in &panels {
            let data = model
                .hooks
                .before_show
                .as_ref()
                .and_then(|hook| hook(row))
                .map(ContextData::Value)
                .unwrap_or_else(|| ContextData::Row(row.clone()));
            let scope = context.child(data, Some(model.name()));
            if let Err(error) = self.host.apply_bindings(&scope, node) {
                self.collapse(row, &nodes);
                return Err(error);
            }
        }

        let finish = countdown(panels.len() + 1, {
            let rows = Arc::clone(&self.rows);
            let id = row.id();
            move || {
                if let Some(children) = rows.lock().get_mut(&id) {
                    children.state = ChildRowState::Shown;
                }
            }
        });

        for (model, node) in panels {
            let done = then(model.hooks.after_show.clone(), row, Arc::clone(&finish));
            match (&model.animate, &self.animator) {
                (Some(animation), Some(animator)) => animator.reveal(node, animation, done),
                _ => {
                    node.set_style("display", None);
                    done();
                }
            }
        }
        finish();

        tracing::debug!(target: targets::CHILDREN, row = row.id().as_u64(), "child rows shown");
        Ok(true)
    }

    /// Collapse `row`'s panels.
    ///
    /// Returns `false` without doing anything unless the panels are shown.
    pub fn hide(&self, row: &Row) -> bool {
        let nodes = {
            let mut rows = self.rows.lock();
            match rows.get_mut(&row.id()) {
                Some(children) if children.state == ChildRowState::Shown => {
                    children.state = ChildRowState::Hiding;
                    children.nodes.clone()
                }
                _ => return false,
            }
        };

        let panels: Vec<(&Arc<ChildRowModel>, &Arc<dyn Element>)> =
            self.models.iter().zip(nodes.iter()).collect();

        let finish = countdown(panels.len() + 1, {
            let rows = Arc::clone(&self.rows);
            let plugin = Arc::clone(&self.plugin);
            let host = Arc::clone(&self.host);
            let row = row.clone();
            let nodes = nodes.clone();
            move || {
                for node in &nodes {
                    host.clean_node(node);
                }
                plugin.hide_child(&row);
                if let Some(children) = rows.lock().get_mut(&row.id()) {
                    children.state = ChildRowState::Hidden;
                    children.nodes.clear();
                }
                tracing::debug!(target: targets::CHILDREN, row = row.id().as_u64(), "child rows hidden");
            }
        });

        for (model, node) in panels {
            if let Some(hook) = &model.hooks.before_hide {
                hook(row);
            }
            let done = then(model.hooks.after_hide.clone(), row, Arc::clone(&finish));
            match (&model.animate, &self.animator) {
                (Some(animation), Some(animator)) => animator.conceal(node, animation, done),
                _ => done(),
            }
        }
        finish();
        true
    }

    /// Show hidden panels or hide shown ones; panels in transition are left alone.
    pub fn toggle(&self, row: &Row, context: &BindingContext) -> Result<ChildRowState> {
        match self.state(row) {
            ChildRowState::Hidden => {
                self.show(row, context)?;
            }
            ChildRowState::Shown => {
                self.hide(row);
            }
            ChildRowState::Showing | ChildRowState::Hiding => {}
        }
        Ok(self.state(row))
    }

    /// Drop the state of a row that left the grid.
    pub fn forget(&self, row: &Row) {
        let removed = self.rows.lock().remove(&row.id());
        if let Some(children) = removed {
            for node in &children.nodes {
                self.host.clean_node(node);
            }
        }
    }

    /// Drop the state of every row.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.rows.lock());
        for children in removed.values() {
            for node in &children.nodes {
                self.host.clean_node(node);
            }
        }
    }

    fn reset(&self, row: &Row) {
        if let Some(children) = self.rows.lock().get_mut(&row.id()) {
            children.state = ChildRowState::Hidden;
            children.nodes.clear();
        }
    }

    fn collapse(&self, row: &Row, nodes: &[Arc<dyn Element>]) {
        for node in nodes {
            self.host.clean_node(node);
        }
        self.plugin.hide_child(row);
        self.reset(row);
    }
}

impl fmt::Debug for ChildRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRows")
            .field("models", &self.models)
            .field("rows", &self.rows.lock().len())
            .finish_non_exhaustive()
    }
}

type Tick = Arc<dyn Fn() + Send + Sync>;

/// A callback that runs `f` on its `count`-th invocation.
fn countdown<F>(count: usize, f: F) -> Tick
where
    F: Fn() + Send + Sync + 'static,
{
    let remaining = AtomicUsize::new(count);
    Arc::new(move || {
        if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            f();
        }
    })
}

/// Run the hook for `row`, then tick.
fn then(hook: Option<ChildHook>, row: &Row, tick: Tick) -> Done {
    let row = row.clone();
    Box::new(move || {
        if let Some(hook) = hook {
            hook(&row);
        }
        tick();
    })
}
