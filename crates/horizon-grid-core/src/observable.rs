//! Observable values with change notification.
//!
//! An [`Observable<T>`] is a shared value container that notifies subscribers
//! through two strictly ordered channels:
//!
//! - **before**: fired with the *current* value, just before a write happens
//! - **after**: fired with the *new* value, once the write has happened
//!
//! Cloning an `Observable` clones the handle, not the value: every clone
//! reads and writes the same slot and shares the same subscribers.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Observable;
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let count = Observable::new(2usize);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let before = seen.clone();
//! let _b = count.subscribe_before(move |old| before.lock().push(format!("before {old}")));
//! let after = seen.clone();
//! let _a = count.subscribe(move |new| after.lock().push(format!("after {new}")));
//!
//! assert!(count.set(3));
//! assert!(!count.set(3));
//! assert_eq!(*seen.lock(), vec!["before 2", "after 3"]);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::signal::{Signal, Subscription};

struct ObservableInner<T> {
    value: RwLock<T>,
    before: Arc<Signal<T>>,
    after: Arc<Signal<T>>,
}

/// A reactive value that notifies subscribers when it changes.
pub struct Observable<T> {
    inner: Arc<ObservableInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Create a new observable with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                value: RwLock::new(value),
                before: Arc::new(Signal::new()),
                after: Arc::new(Signal::new()),
            }),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.value.read())
    }

    /// Set the value without any notification.
    pub fn set_silent(&self, value: T) {
        *self.inner.value.write() = value;
    }

    /// Mutate the value in place and notify both channels unconditionally.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let current = self.get();
        self.inner.before.emit_ref(&current);
        let updated = {
            let mut value = self.inner.value.write();
            f(&mut value);
            value.clone()
        };
        self.emit_after(&updated);
    }

    /// Re-publish the current value on the after channel.
    ///
    /// Use this after mutating shared state reachable from the value that the
    /// observable cannot see.
    pub fn notify(&self) {
        let current = self.get();
        self.emit_after(&current);
    }

    /// Subscribe to the after-change channel.
    pub fn subscribe<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.after.subscribe(slot)
    }

    /// Subscribe to the before-change channel.
    ///
    /// The slot receives the value that is about to be replaced.
    pub fn subscribe_before<F>(&self, slot: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner.before.subscribe(slot)
    }

    /// Number of live subscriptions across both channels.
    pub fn subscriber_count(&self) -> usize {
        self.inner.before.connection_count() + self.inner.after.connection_count()
    }

    /// Returns `true` if both handles share the same underlying value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn emit_after(&self, value: &T) {
        tracing::trace!(
            target: "horizon_grid_core::observable",
            subscribers = self.inner.after.connection_count(),
            "observable changed"
        );
        self.inner.after.emit_ref(value);
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Observable<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// Equal values (by `PartialEq`) are ignored and notify nobody. Otherwise
    /// the before channel fires with the old value, the value is written, and
    /// the after channel fires with the new value.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let current = self.get();
        if current == value {
            return None;
        }

        self.inner.before.emit_ref(&current);
        let old = std::mem::replace(&mut *self.inner.value.write(), value.clone());
        self.emit_after(&value);
        Some(old)
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> From<T> for Observable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.read())
            .finish()
    }
}
