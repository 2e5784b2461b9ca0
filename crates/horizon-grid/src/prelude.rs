//! Prelude module for Horizon Grid.
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```

// ============================================================================
// Reactive primitives
// ============================================================================

pub use horizon_grid_core::{Observable, ObservableVec, Subscription};

// ============================================================================
// Grid
// ============================================================================

pub use crate::controller::{GridEnvironment, GridHandle, GridSettings, GridState, init};
pub use crate::error::{GridError, Result};
pub use crate::options::{SortDirection, TableOptions};

// ============================================================================
// Models
// ============================================================================

pub use crate::child_row::{ChildRowModel, ChildRowOptions, ChildRowState};
pub use crate::column::{ColumnModel, ColumnSpec, ColumnType};
pub use crate::data_model::{DataModel, DataModelOptions, QueryParams};
pub use crate::row::Row;
pub use crate::selection::{Modifier, MultiSelection, SelectionModel, SelectionOptions, SingleSelection};

// ============================================================================
// Host interfaces
// ============================================================================

pub use crate::host::{
    Animation, Animator, BindingContext, BindingHost, ClickEvent, ContextData, Element, TableFactory,
    TablePlugin,
};
