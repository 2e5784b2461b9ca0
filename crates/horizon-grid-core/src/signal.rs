//! Signal/slot system for Horizon Grid.
//!
//! A [`Signal`] holds an ordered list of connected slots (callbacks) and
//! invokes every slot synchronously, in connection order, when emitted.
//! Signals are the notification channel behind [`crate::Observable`] and
//! [`crate::ObservableVec`].
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`Subscription`] - RAII handle that disconnects when disposed or dropped
//! - [`SignalEmitter`] - Type-erased access used by subscriptions
//!
//! # Re-entrancy
//!
//! Emission snapshots the connected slots before invoking any of them, so a
//! slot may connect, disconnect or emit on the same signal without deadlocking.
//! Slots connected during an emission are first invoked by the next emission.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Signal;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI32, Ordering};
//!
//! let signal = Arc::new(Signal::<i32>::new());
//! let total = Arc::new(AtomicI32::new(0));
//!
//! let total_clone = total.clone();
//! let subscription = signal.subscribe(move |value| {
//!     total_clone.fetch_add(*value, Ordering::SeqCst);
//! });
//!
//! signal.emit(40);
//! signal.emit(2);
//! subscription.dispose();
//! signal.emit(100);
//!
//! assert_eq!(total.load(Ordering::SeqCst), 42);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

/// Shared slot function.
type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    /// The slot function to invoke.
    slot: Slot<Args>,
    /// Monotonic connection sequence, used to keep emission in connection order.
    sequence: u64,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots by reference. Use
///   `()` for signals without arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots always run on the emitting thread.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
    /// Next connection sequence number.
    next_sequence: AtomicU64,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
            sequence,
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        self.emit_ref(&args);
    }

    /// Emit the signal with a borrowed argument.
    pub fn emit_ref(&self, args: &Args) {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_grid_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots = self.snapshot();
        tracing::trace!(target: "horizon_grid_core::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(args);
        }
    }

    /// Collect the connected slots in connection order, releasing the lock.
    fn snapshot(&self) -> Vec<Slot<Args>> {
        let connections = self.connections.lock();
        let mut ordered: Vec<(u64, Slot<Args>)> = connections
            .values()
            .map(|conn| (conn.sequence, conn.slot.clone()))
            .collect();
        drop(connections);
        ordered.sort_by_key(|(sequence, _)| *sequence);
        ordered.into_iter().map(|(_, slot)| slot).collect()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Connect a slot and return a [`Subscription`] that owns the connection.
    ///
    /// The subscription holds a weak reference to the signal, so it never
    /// keeps the signal alive and is safe to drop after the signal is gone.
    pub fn subscribe<F>(self: &Arc<Self>, slot: F) -> Subscription
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        let weak: Weak<Self> = Arc::downgrade(self);
        let source: Weak<dyn SignalEmitter> = weak;
        Subscription {
            source: Some(source),
            id,
        }
    }
}

/// Type-erased signal emitter trait for dynamic signal access.
///
/// This trait allows working with signals without knowing their argument type,
/// which is what [`Subscription`] needs to disconnect on drop.
pub trait SignalEmitter: Send + Sync {
    /// Disconnect a connection by ID.
    fn disconnect(&self, id: ConnectionId) -> bool;

    /// Disconnect all connections.
    fn disconnect_all(&self);

    /// Get the number of connections.
    fn connection_count(&self) -> usize;

    /// Check if blocked.
    fn is_blocked(&self) -> bool;

    /// Set blocked state.
    fn set_blocked(&self, blocked: bool);
}

impl<Args: Send + 'static> SignalEmitter for Signal<Args> {
    fn disconnect(&self, id: ConnectionId) -> bool {
        Signal::disconnect(self, id)
    }

    fn disconnect_all(&self) {
        Signal::disconnect_all(self);
    }

    fn connection_count(&self) -> usize {
        Signal::connection_count(self)
    }

    fn is_blocked(&self) -> bool {
        Signal::is_blocked(self)
    }

    fn set_blocked(&self, blocked: bool) {
        Signal::set_blocked(self, blocked);
    }
}

/// An owned signal connection that disconnects when disposed or dropped.
///
/// Created by [`Signal::subscribe`], [`crate::Observable::subscribe`] and
/// [`crate::Observable::subscribe_before`].
#[must_use = "dropping a Subscription disconnects it immediately"]
pub struct Subscription {
    source: Option<Weak<dyn SignalEmitter>>,
    id: ConnectionId,
}

impl Subscription {
    /// Disconnect the slot now.
    pub fn dispose(mut self) {
        self.release();
    }

    /// Returns `true` while the source signal is alive and the slot connected.
    pub fn is_active(&self) -> bool {
        self.source.as_ref().and_then(Weak::upgrade).is_some()
    }

    /// The connection this subscription owns.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    fn release(&mut self) {
        if let Some(source) = self.source.take().and_then(|weak| weak.upgrade()) {
            source.disconnect(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
static_assertions::assert_impl_all!(Subscription: Send, Sync);
