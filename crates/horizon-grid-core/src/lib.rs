//! Reactive primitives for Horizon Grid.
//!
//! This crate provides the observable plumbing the grid engine is built on:
//!
//! - **Signal/Slot System**: Ordered, re-entrant notification channels
//! - **Observables**: Shared values with before/after change notification
//! - **Observable Collections**: Sequences reporting granular add/remove changes
//! - **Identifiers**: Prefix-based unique name generation
//! - **Task Queue**: Deferred work run after the current call stack
//!
//! # Observable Example
//!
//! ```
//! use horizon_grid_core::{Observable, ObservableVec};
//!
//! let visible = Observable::new(true);
//! let _sub = visible.subscribe(|shown| println!("visible: {shown}"));
//! visible.set(false);
//!
//! let rows = ObservableVec::new(vec!["a", "b"]);
//! rows.push("c");
//! assert_eq!(rows.len(), 3);
//! ```

pub mod id;
pub mod logging;
pub mod observable;
pub mod observable_vec;
pub mod signal;
pub mod task;

pub use id::IdGenerator;
pub use logging::PerfSpan;
pub use observable::Observable;
pub use observable_vec::{ArrayChange, ObservableVec, compare_sequences};
pub use signal::{ConnectionId, Signal, SignalEmitter, Subscription};
pub use task::{BoxedTask, DeferredTaskQueue, ImmediateTaskQueue, TaskId, TaskQueue};
