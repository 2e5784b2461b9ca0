//! Per-cell binding state.
//!
//! Every table cell is bound to its column template at most once per node.
//! The [`CellBindings`] arena records which cells are bound, keyed by section
//! (header, footer or a body row) and column position, and is cleared per row
//! when the row leaves the grid.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};

use crate::host::Element;
use crate::row::RowId;

new_key_type! {
    /// Handle of one bound cell in the arena.
    pub struct CellBindingId;
}

/// The part of the table a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellSection {
    /// Header row.
    Header,
    /// Footer row.
    Footer,
    /// A body row.
    Data(RowId),
}

/// A cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    /// Section of the cell.
    pub section: CellSection,
    /// Column position.
    pub column: usize,
}

impl CellKey {
    /// Header cell of `column`.
    pub fn header(column: usize) -> Self {
        Self {
            section: CellSection::Header,
            column,
        }
    }

    /// Footer cell of `column`.
    pub fn footer(column: usize) -> Self {
        Self {
            section: CellSection::Footer,
            column,
        }
    }

    /// Body cell of `row` at `column`.
    pub fn data(row: RowId, column: usize) -> Self {
        Self {
            section: CellSection::Data(row),
            column,
        }
    }
}

struct CellBinding {
    key: CellKey,
    node: Arc<dyn Element>,
}

/// Arena of bound cells.
#[derive(Default)]
pub struct CellBindings {
    cells: SlotMap<CellBindingId, CellBinding>,
    index: HashMap<CellKey, CellBindingId>,
    rows: HashMap<RowId, Vec<CellBindingId>>,
}

impl CellBindings {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for binding to `node`.
    ///
    /// Returns `None` when the cell is already bound to this very node.
    /// A cell realized again on a different node is claimed afresh.
    pub fn claim(&mut self, key: CellKey, node: &Arc<dyn Element>) -> Option<CellBindingId> {
        if let Some(&id) = self.index.get(&key) {
            let binding = self.cells.get_mut(id)?;
            if same_node(&binding.node, node) {
                return None;
            }
            binding.node = Arc::clone(node);
            return Some(id);
        }

        let id = self.cells.insert(CellBinding {
            key,
            node: Arc::clone(node),
        });
        self.index.insert(key, id);
        if let CellSection::Data(row) = key.section {
            self.rows.entry(row).or_default().push(id);
        }
        Some(id)
    }

    /// Returns `true` if `key` is bound.
    pub fn is_bound(&self, key: &CellKey) -> bool {
        self.index.contains_key(key)
    }

    /// Forget one binding, returning its node.
    pub fn release(&mut self, key: &CellKey) -> Option<Arc<dyn Element>> {
        let id = self.index.remove(key)?;
        let binding = self.cells.remove(id)?;
        if let CellSection::Data(row) = binding.key.section
            && let Some(ids) = self.rows.get_mut(&row)
        {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.rows.remove(&row);
            }
        }
        Some(binding.node)
    }

    /// Forget every binding of a body row, returning the bound nodes.
    pub fn clear_row(&mut self, row: RowId) -> Vec<Arc<dyn Element>> {
        let ids = self.rows.remove(&row).unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.cells.remove(id))
            .map(|binding| {
                self.index.remove(&binding.key);
                binding.node
            })
            .collect()
    }

    /// Forget every binding of the header or footer, returning the bound nodes.
    pub fn clear_section(&mut self, section: CellSection) -> Vec<Arc<dyn Element>> {
        if let CellSection::Data(row) = section {
            return self.clear_row(row);
        }
        let keys: Vec<CellKey> = self
            .index
            .keys()
            .filter(|key| key.section == section)
            .copied()
            .collect();
        keys.iter().filter_map(|key| self.release(key)).collect()
    }

    /// Forget everything, returning every bound node.
    pub fn clear(&mut self) -> Vec<Arc<dyn Element>> {
        self.index.clear();
        self.rows.clear();
        self.cells.drain().map(|(_, binding)| binding.node).collect()
    }

    /// Number of bound cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell is bound.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of body rows with at least one bound cell.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Debug for CellBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellBindings")
            .field("cells", &self.cells.len())
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// Node identity, ignoring the vtable half of the pointer.
pub(crate) fn same_node(a: &Arc<dyn Element>, b: &Arc<dyn Element>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
