//! Horizon Grid - a declarative data grid binding observable row models to a
//! paged, sorted table view.
//!
//! The grid sits between three parties:
//!
//! - a [`DataModel`]: observable rows plus observable query parameters, with an
//!   optional request hook for server-side paging
//! - a table plugin ([`host::TablePlugin`]) that owns paging, sorting and
//!   searching and realizes rows as nodes
//! - a binding host ([`host::BindingHost`]) that renders templates into nodes
//!
//! [`init`] wires them together for one table element. Columns come from
//! [`ColumnModel`]s (or are inferred from the first row), rows can be selected
//! through [`SingleSelection`] / [`MultiSelection`], and rows can expand into
//! detail panels described by [`ChildRowModel`]s.
//!
//! # Example
//!
//! ```
//! use horizon_grid::{DataModel, Row, derive_title};
//! use serde_json::json;
//!
//! let rows = vec![
//!     Row::try_from(json!({"firstName": "Ann", "active": true})).unwrap(),
//!     Row::try_from(json!({"firstName": "Bob", "active": false})).unwrap(),
//! ];
//! let model = DataModel::new(rows);
//! assert_eq!(model.rows().len(), 2);
//! assert_eq!(derive_title("firstName"), "first Name");
//! ```

pub mod child_row;
pub mod column;
pub mod controller;
pub mod data_model;
pub mod error;
pub mod host;
pub mod markup;
pub mod options;
pub mod prelude;
pub mod row;
pub mod selection;
pub mod template;
pub mod value;

pub use child_row::{ChildRowInput, ChildRowModel, ChildRowOptions, ChildRowState, ChildRows};
pub use column::{
    ColumnEnv, ColumnInput, ColumnModel, ColumnSpec, ColumnType, TypeDetector, default_type_detector,
    derive_title, infer_columns,
};
pub use controller::{GridEnvironment, GridHandle, GridSettings, GridState, ResizeState, init};
pub use data_model::{
    CellEvent, DataModel, DataModelBuilder, DataModelInput, DataModelOptions, QueryParams,
    RequestCompletion,
};
pub use error::{GridError, Result};
pub use options::{OrderEntry, SortDirection, TableOptions};
pub use row::{Row, RowDiff, RowId, diff_rows};
pub use selection::{
    Modifier, MultiSelection, SelectionHooks, SelectionModel, SelectionOptions, SingleSelection,
};
pub use template::{TemplateRegistry, TemplateSource};
pub use value::structurally_equal;

pub use horizon_grid_core::{IdGenerator, Observable, ObservableVec, Subscription};
