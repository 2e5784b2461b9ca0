//! Observable collections.
//!
//! [`ObservableVec<T>`] is an [`Observable`] whose value is a sequence. Besides
//! the whole-value before/after channels it publishes granular
//! [`ArrayChange`] lists describing which items were added or removed.

use std::sync::Arc;

use crate::observable::Observable;
use crate::signal::{Signal, Subscription};

/// A single granular change to an observable collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayChange<T> {
    /// `value` now lives at `index` of the new sequence.
    Added {
        /// Position in the new sequence.
        index: usize,
        /// The added item.
        value: T,
    },
    /// `value` used to live at `index` of the old sequence.
    Removed {
        /// Position in the old sequence.
        index: usize,
        /// The removed item.
        value: T,
    },
}

/// Compute the granular changes between two sequences.
///
/// Items are matched by `PartialEq`; an item present on both sides is not
/// reported even if its position moved. Removals are listed before additions.
pub fn compare_sequences<T: Clone + PartialEq>(before: &[T], after: &[T]) -> Vec<ArrayChange<T>> {
    let mut changes = Vec::new();

    for (index, value) in before.iter().enumerate() {
        if !after.contains(value) {
            changes.push(ArrayChange::Removed {
                index,
                value: value.clone(),
            });
        }
    }

    for (index, value) in after.iter().enumerate() {
        if !before.contains(value) {
            changes.push(ArrayChange::Added {
                index,
                value: value.clone(),
            });
        }
    }

    changes
}

/// An observable sequence with granular add/remove notifications.
///
/// Like [`Observable`], cloning produces another handle to the same sequence.
pub struct ObservableVec<T> {
    items: Observable<Vec<T>>,
    changes: Arc<Signal<Vec<ArrayChange<T>>>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ObservableVec<T> {
    /// Create a collection holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Observable::new(items),
            changes: Arc::new(Signal::new()),
        }
    }

    /// Snapshot of the current items.
    pub fn get(&self) -> Vec<T> {
        self.items.get()
    }

    /// Access the items without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        self.items.with(|items| f(items))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.with(Vec::is_empty)
    }

    /// Returns `true` if `value` is in the collection.
    pub fn contains(&self, value: &T) -> bool {
        self.items.with(|items| items.contains(value))
    }

    /// Clone of the item at `index`.
    pub fn get_at(&self, index: usize) -> Option<T> {
        self.items.with(|items| items.get(index).cloned())
    }

    /// Append an item.
    pub fn push(&self, value: T) {
        let index = self.len();
        self.items.update(|items| items.push(value.clone()));
        self.changes.emit(vec![ArrayChange::Added { index, value }]);
    }

    /// Remove every occurrence of `value`. Returns `true` if anything was removed.
    pub fn remove(&self, value: &T) -> bool {
        self.retain(|item| item != value) > 0
    }

    /// Keep only the items for which `keep` returns `true`.
    ///
    /// Returns the number of removed items; nothing is notified when that is zero.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let removed: Vec<ArrayChange<T>> = self.items.with(|items| {
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| !keep(item))
                .map(|(index, value)| ArrayChange::Removed {
                    index,
                    value: value.clone(),
                })
                .collect()
        });

        if removed.is_empty() {
            return 0;
        }

        let count = removed.len();
        self.items.update(|items| {
            let mut position = 0;
            items.retain(|_| {
                let dropped = removed
                    .iter()
                    .any(|change| matches!(change, ArrayChange::Removed { index, .. } if *index == position));
                position += 1;
                !dropped
            });
        });
        self.changes.emit(removed);
        count
    }

    /// Remove all items.
    pub fn clear(&self) {
        self.retain(|_| false);
    }

    /// Replace the whole sequence.
    ///
    /// Returns `false` and notifies nobody when `items` equals the current
    /// sequence.
    pub fn replace_all(&self, items: Vec<T>) -> bool {
        let before = self.get();
        if before == items {
            return false;
        }

        let changes = compare_sequences(&before, &items);
        self.items.set(items);
        if !changes.is_empty() {
            self.changes.emit(changes);
        }
        true
    }

    /// Re-publish the current sequence on the after channel without changing it.
    pub fn notify(&self) {
        self.items.notify();
    }

    /// Subscribe to the after-change channel (receives the new sequence).
    pub fn subscribe<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&Vec<T>) + Send + Sync + 'static,
    {
        self.items.subscribe(slot)
    }

    /// Subscribe to the before-change channel (receives the old sequence).
    pub fn subscribe_before<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&Vec<T>) + Send + Sync + 'static,
    {
        self.items.subscribe_before(slot)
    }

    /// Subscribe to granular add/remove notifications.
    pub fn subscribe_changes<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&Vec<ArrayChange<T>>) + Send + Sync + 'static,
    {
        self.changes.subscribe(slot)
    }

    /// The whole-value observable behind this collection.
    pub fn as_observable(&self) -> &Observable<Vec<T>> {
        &self.items
    }

    /// Returns `true` if both handles share the same underlying sequence.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.items.ptr_eq(&other.items)
    }
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            changes: Arc::clone(&self.changes),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.items)
            .finish()
    }
}
