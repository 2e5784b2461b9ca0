//! Row selection models.
//!
//! A selection model owns one observable selection and decorates the grid's
//! realized rows: when a row is registered the model attaches a click handler
//! to the row's node and keeps the node so it can toggle the highlight class.
//!
//! - [`SingleSelection`]: at most one selected row
//! - [`MultiSelection`]: any number of selected rows, with modifier-click toggling
//!
//! Several models may register against one grid; each decorates rows
//! independently.
//!
//! # Example
//!
//! ```
//! use horizon_grid::selection::{MultiSelection, SelectionModel, SelectionOptions};
//! use horizon_grid::host::ClickEvent;
//! use horizon_grid::Row;
//! use serde_json::json;
//!
//! let selection = MultiSelection::new(SelectionOptions::default());
//! let a = Row::try_from(json!({"id": 1})).unwrap();
//! let b = Row::try_from(json!({"id": 2})).unwrap();
//!
//! selection.select(&a, &ClickEvent::plain()).unwrap();
//! selection.select(&b, &ClickEvent::with_ctrl()).unwrap();
//! assert_eq!(selection.selected().get(), vec![a.clone(), b.clone()]);
//!
//! selection.select(&b, &ClickEvent::plain()).unwrap();
//! assert_eq!(selection.selected().get(), vec![b]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Observable, ObservableVec, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::host::{ClickEvent, Element};
use crate::row::{Row, RowId};

/// Keyboard modifier that switches a click to toggle semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// Control key.
    #[default]
    Ctrl,
    /// Shift key.
    Shift,
    /// Alt/option key.
    Alt,
    /// Meta/command key.
    Meta,
}

impl Modifier {
    /// Returns `true` if this modifier is held in `event`.
    pub fn is_active(self, event: &ClickEvent) -> bool {
        match self {
            Self::Ctrl => event.ctrl,
            Self::Shift => event.shift,
            Self::Alt => event.alt,
            Self::Meta => event.meta,
        }
    }
}

/// Loadable selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionOptions {
    /// CSS class applied to selected rows.
    pub class: String,
    /// Modifier that toggles selection.
    pub modifier: Modifier,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            class: "selected".to_string(),
            modifier: Modifier::default(),
        }
    }
}

/// Hook receiving a selection value.
pub type SelectionHook<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Change hooks of a selection model.
pub struct SelectionHooks<V> {
    on_change: Option<SelectionHook<V>>,
    on_before: Option<SelectionHook<V>>,
}

impl<V> SelectionHooks<V> {
    /// No hooks.
    pub fn new() -> Self {
        Self {
            on_change: None,
            on_before: None,
        }
    }

    /// Run `hook` with the new selection after every change.
    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(hook));
        self
    }

    /// Run `hook` with the old selection before every change.
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.on_before = Some(Arc::new(hook));
        self
    }
}

impl<V> Default for SelectionHooks<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Realized row nodes known to a selection model.
#[derive(Default)]
pub struct RowElements {
    nodes: Mutex<HashMap<RowId, Arc<dyn Element>>>,
}

impl RowElements {
    /// Remember the node of `row`.
    pub fn insert(&self, row: &Row, element: Arc<dyn Element>) {
        self.nodes.lock().insert(row.id(), element);
    }

    /// Forget the node of `row`.
    pub fn remove(&self, row: &Row) -> bool {
        self.nodes.lock().remove(&row.id()).is_some()
    }

    /// The node of `row`, if registered.
    pub fn get(&self, row: &Row) -> Option<Arc<dyn Element>> {
        self.nodes.lock().get(&row.id()).cloned()
    }

    /// Number of registered rows.
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Returns `true` if no row is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    fn highlight(&self, row: &Row, class: &str) {
        if let Some(element) = self.get(row) {
            element.add_class(class);
        }
    }

    fn unhighlight(&self, row: &Row, class: &str) {
        if let Some(element) = self.get(row) {
            element.remove_class(class);
        }
    }
}

impl fmt::Debug for RowElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowElements").field("rows", &self.len()).finish()
    }
}

/// A selection model the grid registers rows with.
pub trait SelectionModel: Send + Sync + 'static {
    /// Apply a click on `row`.
    ///
    /// The base behavior is abstract and fails with
    /// [`GridError::AbstractOperation`].
    fn select(&self, _row: &Row, _event: &ClickEvent) -> Result<()> {
        Err(GridError::abstract_operation("select"))
    }

    /// Returns `true` if `row` is currently selected.
    fn is_selected(&self, _row: &Row) -> bool {
        false
    }

    /// CSS class applied to selected rows.
    fn class(&self) -> &str;

    /// The row nodes this model decorates.
    fn elements(&self) -> &RowElements;

    /// A row was realized: track its node and make clicks select it.
    fn on_register(self: Arc<Self>, row: &Row, element: &Arc<dyn Element>) {
        self.elements().insert(row, Arc::clone(element));
        if self.is_selected(row) {
            element.add_class(self.class());
        }

        let row = row.clone();
        element.on_click(Box::new(move |event: &ClickEvent| {
            if let Err(error) = self.select(&row, event) {
                tracing::warn!(target: targets::SELECTION, %error, "selection failed");
            }
        }));
    }

    /// A row left the grid.
    fn on_unregister(&self, row: &Row) {
        self.elements().remove(row);
    }
}

/// State shared by every selection model: the observable selection, the
/// highlight class, the toggle modifier and the hook subscriptions.
///
/// Used on its own it is an abstract model whose `select` fails.
pub struct SelectionBase<V> {
    selected: Observable<V>,
    options: SelectionOptions,
    elements: RowElements,
    _hooks: Vec<Subscription>,
}

impl<V: Clone + PartialEq + Send + Sync + 'static> SelectionBase<V> {
    /// Wrap `selected`, subscribing `hooks` to it.
    pub fn new(selected: Observable<V>, options: SelectionOptions, hooks: SelectionHooks<V>) -> Self {
        let mut subscriptions = Vec::new();
        if let Some(hook) = hooks.on_before {
            subscriptions.push(selected.subscribe_before(move |value| hook(value)));
        }
        if let Some(hook) = hooks.on_change {
            subscriptions.push(selected.subscribe(move |value| hook(value)));
        }

        Self {
            selected,
            options,
            elements: RowElements::default(),
            _hooks: subscriptions,
        }
    }

    /// The observable selection.
    pub fn selected(&self) -> &Observable<V> {
        &self.selected
    }

    /// The toggle modifier.
    pub fn modifier(&self) -> Modifier {
        self.options.modifier
    }

    /// The settings this model was built with.
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    fn highlight(&self, row: &Row) {
        self.elements.highlight(row, &self.options.class);
    }

    fn unhighlight(&self, row: &Row) {
        self.elements.unhighlight(row, &self.options.class);
    }
}

impl<V: Clone + PartialEq + Send + Sync + 'static> SelectionModel for SelectionBase<V> {
    fn class(&self) -> &str {
        &self.options.class
    }

    fn elements(&self) -> &RowElements {
        &self.elements
    }
}

impl<V> fmt::Debug for SelectionBase<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionBase")
            .field("options", &self.options)
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

/// Selects at most one row.
///
/// Clicking another row moves the selection. Clicking the selected row with
/// the modifier held clears the selection; without it nothing happens.
#[derive(Debug)]
pub struct SingleSelection {
    base: SelectionBase<Option<Row>>,
}

impl SingleSelection {
    /// A model with its own empty selection.
    pub fn new(options: SelectionOptions) -> Self {
        Self::with_selected(Observable::new(None), options, SelectionHooks::new())
    }

    /// A model over an existing selection observable.
    pub fn with_selected(
        selected: Observable<Option<Row>>,
        options: SelectionOptions,
        hooks: SelectionHooks<Option<Row>>,
    ) -> Self {
        Self {
            base: SelectionBase::new(selected, options, hooks),
        }
    }

    /// The observable selection.
    pub fn selected(&self) -> &Observable<Option<Row>> {
        self.base.selected()
    }

    /// The toggle modifier.
    pub fn modifier(&self) -> Modifier {
        self.base.modifier()
    }
}

impl SelectionModel for SingleSelection {
    fn select(&self, row: &Row, event: &ClickEvent) -> Result<()> {
        let current = self.base.selected.get();
        if current.as_ref() == Some(row) {
            if self.base.modifier().is_active(event) {
                self.base.selected.set(None);
                self.base.unhighlight(row);
            }
            return Ok(());
        }

        self.base.selected.set(Some(row.clone()));
        self.base.highlight(row);
        if let Some(previous) = current {
            self.base.unhighlight(&previous);
        }
        Ok(())
    }

    fn is_selected(&self, row: &Row) -> bool {
        self.base.selected.with(|selected| selected.as_ref() == Some(row))
    }

    fn class(&self) -> &str {
        self.base.class()
    }

    fn elements(&self) -> &RowElements {
        self.base.elements()
    }
}

/// Selects any number of rows.
///
/// With the modifier held a click toggles the row in or out of the
/// selection. Without it the selection collapses to the clicked row.
#[derive(Debug)]
pub struct MultiSelection {
    rows: ObservableVec<Row>,
    base: SelectionBase<Vec<Row>>,
}

impl MultiSelection {
    /// A model with its own empty selection.
    pub fn new(options: SelectionOptions) -> Self {
        Self::with_selected(ObservableVec::new(Vec::new()), options, SelectionHooks::new())
    }

    /// A model over an existing selection collection.
    pub fn with_selected(
        selected: ObservableVec<Row>,
        options: SelectionOptions,
        hooks: SelectionHooks<Vec<Row>>,
    ) -> Self {
        let base = SelectionBase::new(selected.as_observable().clone(), options, hooks);
        Self {
            rows: selected,
            base,
        }
    }

    /// The observable selection.
    pub fn selected(&self) -> &ObservableVec<Row> {
        &self.rows
    }

    /// The toggle modifier.
    pub fn modifier(&self) -> Modifier {
        self.base.modifier()
    }
}

impl SelectionModel for MultiSelection {
    fn select(&self, row: &Row, event: &ClickEvent) -> Result<()> {
        if self.base.modifier().is_active(event) {
            if self.rows.contains(row) {
                self.rows.remove(row);
                self.base.unhighlight(row);
            } else {
                self.rows.push(row.clone());
                self.base.highlight(row);
            }
            return Ok(());
        }

        let previous = self.rows.get();
        if previous.len() == 1 && previous[0] == *row {
            return Ok(());
        }

        self.rows.replace_all(vec![row.clone()]);
        for other in previous.iter().filter(|other| *other != row) {
            self.base.unhighlight(other);
        }
        self.base.highlight(row);
        Ok(())
    }

    fn is_selected(&self, row: &Row) -> bool {
        self.rows.contains(row)
    }

    fn class(&self) -> &str {
        self.base.class()
    }

    fn elements(&self) -> &RowElements {
        self.base.elements()
    }
}
