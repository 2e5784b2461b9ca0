//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid=debug")
//!     .init();
//! ```
//!
//! The [`targets`] module lists the target names used by each subsystem so
//! they can be filtered individually.

/// Target names for log filtering.
pub mod targets {
    /// Reactive primitives target.
    pub const CORE: &str = "horizon_grid_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Observable values target.
    pub const OBSERVABLE: &str = "horizon_grid_core::observable";
    /// Deferred task target.
    pub const TASK: &str = "horizon_grid_core::task";
    /// Grid controller target.
    pub const CONTROLLER: &str = "horizon_grid::controller";
    /// Data model target.
    pub const DATA: &str = "horizon_grid::data";
    /// Server request adapter target.
    pub const SERVER: &str = "horizon_grid::server";
    /// Selection models target.
    pub const SELECTION: &str = "horizon_grid::selection";
    /// Child-row models target.
    pub const CHILDREN: &str = "horizon_grid::children";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing an operation such as a full table redraw.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a performance span for `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::{DeferredTaskQueue, Observable, TaskQueue};

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_subscriber_receives_core_targets() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _span = PerfSpan::new("redraw");
            let value = Observable::new(1);
            let _sub = value.subscribe(|_| {});
            value.set(2);

            let queue = DeferredTaskQueue::new();
            queue.post(Box::new(|| {}));
            queue.process_all();
        });

        let output = String::from_utf8_lossy(&capture.0.lock()).into_owned();
        assert!(output.contains(targets::OBSERVABLE));
        assert!(output.contains(targets::SIGNAL));
        assert!(output.contains(targets::TASK));
        assert!(output.contains("operation=\"redraw\""));
    }
}
