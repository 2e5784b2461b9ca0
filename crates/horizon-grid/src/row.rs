//! Row records.
//!
//! A [`Row`] is a shared handle to one application record. Rows compare by
//! identity: two rows built from equal data are still different rows, and a
//! clone of a row is the same row. This is what row-collection diffing relies
//! on.
//!
//! A row starts with raw field values. Mapping it (see
//! [`DataModel::map_row`](crate::DataModel::map_row)) wraps every field in an
//! [`Observable`] so each cell can re-render on its own. The set of field keys
//! is fixed when the row is built.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use horizon_grid_core::Observable;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{GridError, Result};

/// Process-unique row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    /// Get the raw u64 value of this row ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// A field value, raw until the row is mapped.
#[derive(Debug, Clone)]
pub enum Field {
    /// A plain value.
    Raw(Value),
    /// An individually observable value.
    Observed(Observable<Value>),
}

impl Field {
    /// Current value of the field.
    pub fn value(&self) -> Value {
        match self {
            Self::Raw(value) => value.clone(),
            Self::Observed(cell) => cell.get(),
        }
    }
}

struct RowInner {
    id: RowId,
    array: bool,
    fields: RwLock<Vec<(String, Field)>>,
}

/// A shared, identity-compared application record.
#[derive(Clone)]
pub struct Row {
    inner: Arc<RowInner>,
}

impl Row {
    fn build(array: bool, fields: Vec<(String, Field)>) -> Self {
        Self {
            inner: Arc::new(RowInner {
                id: RowId(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed)),
                array,
                fields: RwLock::new(fields),
            }),
        }
    }

    /// Build a row from an object's fields, in the object's order.
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self::build(
            false,
            object
                .into_iter()
                .map(|(key, value)| (key, Field::Raw(value)))
                .collect(),
        )
    }

    /// Build a row from an array; field keys are the positions `"0"`, `"1"`, ...
    pub fn from_array(values: Vec<Value>) -> Self {
        Self::build(
            true,
            values
                .into_iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), Field::Raw(value)))
                .collect(),
        )
    }

    /// Build an object row from fields that may already be observable.
    ///
    /// Pre-observed fields are kept as they are when the row is mapped.
    pub fn from_cells<I, K>(cells: I) -> Self
    where
        I: IntoIterator<Item = (K, Field)>,
        K: Into<String>,
    {
        Self::build(
            false,
            cells.into_iter().map(|(key, field)| (key.into(), field)).collect(),
        )
    }

    /// This row's identifier.
    pub fn id(&self) -> RowId {
        self.inner.id
    }

    /// Returns `true` if the row was built from an array.
    pub fn is_array(&self) -> bool {
        self.inner.array
    }

    /// Field keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.read().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.inner.fields.read().len()
    }

    /// Returns `true` if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.inner.fields.read().is_empty()
    }

    /// Current value of `key`, whether raw or observed.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner
            .fields
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, field)| field.value())
    }

    /// The observable cell for `key`, once that field is observed.
    pub fn cell(&self, key: &str) -> Option<Observable<Value>> {
        self.inner
            .fields
            .read()
            .iter()
            .find_map(|(k, field)| match field {
                Field::Observed(cell) if k == key => Some(cell.clone()),
                _ => None,
            })
    }

    /// Returns `true` once every field is observable.
    pub fn is_mapped(&self) -> bool {
        self.inner
            .fields
            .read()
            .iter()
            .all(|(_, field)| matches!(field, Field::Observed(_)))
    }

    /// Wrap every raw field in an observable, leaving observed fields as-is.
    ///
    /// Returns every field's key and observable, in order.
    pub fn observe_fields(&self) -> Vec<(String, Observable<Value>)> {
        let mut fields = self.inner.fields.write();
        fields
            .iter_mut()
            .map(|(key, field)| {
                let cell = match field {
                    Field::Observed(cell) => cell.clone(),
                    Field::Raw(value) => {
                        let cell = Observable::new(std::mem::take(value));
                        *field = Field::Observed(cell.clone());
                        cell
                    }
                };
                (key.clone(), cell)
            })
            .collect()
    }

    /// Snapshot of the row as a plain value (array rows become arrays).
    pub fn to_value(&self) -> Value {
        let fields = self.inner.fields.read();
        if self.inner.array {
            Value::Array(fields.iter().map(|(_, field)| field.value()).collect())
        } else {
            Value::Object(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), field.value()))
                    .collect(),
            )
        }
    }
}

impl TryFrom<Value> for Row {
    type Error = GridError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self::from_object(object)),
            Value::Array(values) => Ok(Self::from_array(values)),
            other => Err(GridError::invalid_row(format!(
                "expected an object or an array, found {other}"
            ))),
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Row {}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.inner.id.0)
            .field("data", &self.to_value())
            .finish()
    }
}

/// Rows to convert from plain JSON.
///
/// Returns [`GridError::InvalidRow`] for the first entry that is neither an
/// object nor an array.
pub fn rows_from_values(values: impl IntoIterator<Item = Value>) -> Result<Vec<Row>> {
    values.into_iter().map(Row::try_from).collect()
}

/// Rows that left and arrived between two snapshots of a row collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDiff {
    /// Rows present before but not after, in `before` order.
    pub removed: Vec<Row>,
    /// Rows present after but not before, in `after` order.
    pub added: Vec<Row>,
}

impl RowDiff {
    /// Returns `true` if no row left or arrived.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Identity set-difference between two row snapshots.
pub fn diff_rows(before: &[Row], after: &[Row]) -> RowDiff {
    let before_ids: HashSet<RowId> = before.iter().map(Row::id).collect();
    let after_ids: HashSet<RowId> = after.iter().map(Row::id).collect();

    RowDiff {
        removed: before
            .iter()
            .filter(|row| !after_ids.contains(&row.id()))
            .cloned()
            .collect(),
        added: after
            .iter()
            .filter(|row| !before_ids.contains(&row.id()))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_row(value: Value) -> Row {
        Row::try_from(value).unwrap()
    }

    #[test]
    fn test_identity_equality() {
        let a = object_row(json!({"id": 1}));
        let b = object_row(json!({"id": 1}));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_array_row_keys() {
        let row = object_row(json!(["x", true]));
        assert!(row.is_array());
        assert_eq!(row.keys(), vec!["0", "1"]);
        assert_eq!(row.value("1"), Some(json!(true)));
        assert_eq!(row.to_value(), json!(["x", true]));
    }

    #[test]
    fn test_invalid_row() {
        let err = Row::try_from(json!(42)).unwrap_err();
        assert!(matches!(err, GridError::InvalidRow { .. }));
        assert!(rows_from_values(vec![json!({}), json!("x")]).is_err());
    }

    #[test]
    fn test_observe_fields_is_idempotent() {
        let row = object_row(json!({"a": 1, "b": "two"}));
        assert!(!row.is_mapped());
        assert!(row.cell("a").is_none());

        let first = row.observe_fields();
        let second = row.observe_fields();
        assert!(row.is_mapped());
        assert_eq!(first.len(), 2);
        assert!(first[0].1.ptr_eq(&second[0].1));
        assert!(first[1].1.ptr_eq(&second[1].1));
    }

    #[test]
    fn test_cells_are_independent() {
        let row = object_row(json!({"a": 1, "b": 2}));
        row.observe_fields();
        row.cell("a").unwrap().set(json!(10));
        assert_eq!(row.value("a"), Some(json!(10)));
        assert_eq!(row.value("b"), Some(json!(2)));
        assert_eq!(row.to_value(), json!({"a": 10, "b": 2}));
    }

    #[test]
    fn test_pre_observed_cells_kept() {
        let name = Observable::new(json!("ada"));
        let row = Row::from_cells([
            ("name", Field::Observed(name.clone())),
            ("age", Field::Raw(json!(36))),
        ]);
        let cells = row.observe_fields();
        assert!(cells[0].1.ptr_eq(&name));
    }

    #[test]
    fn test_diff_rows() {
        let rows: Vec<Row> = (1..=4).map(|n| object_row(json!({"n": n}))).collect();
        let before = vec![rows[0].clone(), rows[1].clone(), rows[2].clone()];
        let after = vec![rows[1].clone(), rows[2].clone(), rows[3].clone()];

        let diff = diff_rows(&before, &after);
        assert_eq!(diff.removed, vec![rows[0].clone()]);
        assert_eq!(diff.added, vec![rows[3].clone()]);
        assert!(diff_rows(&before, &before).is_empty());
    }
}
