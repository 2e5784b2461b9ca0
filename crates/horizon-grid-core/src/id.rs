//! Unique identifier generation.
//!
//! An [`IdGenerator`] produces strings of the form `prefix + n` where `n`
//! starts at zero and increments by one per call. Generators are independent
//! of each other; two generators with the same prefix produce the same
//! sequence.

use std::sync::atomic::{AtomicU64, Ordering};

/// Produces `prefix0`, `prefix1`, `prefix2`, ...
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl IdGenerator {
    /// Create a generator for `prefix`, starting at zero.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Return the next identifier.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }

    /// The prefix every identifier starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
