//! Deferred task execution.
//!
//! Work that must run "after the current turn" (for example re-applying
//! bindings once a responsive resize settles) is posted to a [`TaskQueue`].
//! The embedding environment decides when queued work runs:
//!
//! - [`ImmediateTaskQueue`] runs every task synchronously inside `post`
//! - [`DeferredTaskQueue`] holds tasks until [`DeferredTaskQueue::process_all`]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A unique identifier for a deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

/// A boxed task closure.
pub type BoxedTask = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to post work that runs after the current call stack unwinds.
pub trait TaskQueue: Send + Sync {
    /// Queue a task. Returns an id usable with [`TaskQueue::cancel`].
    fn post(&self, task: BoxedTask) -> TaskId;

    /// Cancel a pending task. Returns `true` if it had not run yet.
    fn cancel(&self, _id: TaskId) -> bool {
        false
    }
}

/// Runs each task as soon as it is posted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateTaskQueue;

impl TaskQueue for ImmediateTaskQueue {
    fn post(&self, task: BoxedTask) -> TaskId {
        let id = next_task_id();
        task();
        id
    }
}

struct TaskData {
    id: TaskId,
    task: BoxedTask,
}

/// Holds posted tasks until the owner drains them.
///
/// Tasks run outside the internal lock, so a task may post further tasks;
/// those run in the same [`process_all`](Self::process_all) call.
pub struct DeferredTaskQueue {
    tasks: Mutex<VecDeque<TaskData>>,
}

impl DeferredTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Check if there are any pending tasks.
    pub fn has_pending(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Get the number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run pending tasks until the queue is empty.
    ///
    /// Returns the number of tasks processed.
    pub fn process_all(&self) -> usize {
        let mut count = 0;
        loop {
            let next = self.tasks.lock().pop_front();
            match next {
                Some(task_data) => {
                    tracing::trace!(
                        target: "horizon_grid_core::task",
                        task = task_data.id.as_u64(),
                        "running deferred task"
                    );
                    (task_data.task)();
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}

impl TaskQueue for DeferredTaskQueue {
    fn post(&self, task: BoxedTask) -> TaskId {
        let id = next_task_id();
        self.tasks.lock().push_back(TaskData { id, task });
        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        if let Some(pos) = tasks.iter().position(|t| t.id == id) {
            tasks.remove(pos);
            true
        } else {
            false
        }
    }
}

impl Default for DeferredTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeferredTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTaskQueue")
            .field("pending", &self.pending_count())
            .finish()
    }
}
