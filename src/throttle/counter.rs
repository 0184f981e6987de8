//! Event counter shared by every caller of one gate.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts events seen in the current period.
///
/// The counter is lock-free: callers only ever `fetch_add`, and the period
/// timer only ever swaps it back to zero. Both are single atomic operations,
/// so an increment racing a drain lands wholly on one side of it.
#[derive(Debug, Default)]
pub struct EventCounter {
    count: AtomicU64,
}

impl EventCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Record one event and return the post-increment count.
    ///
    /// A return value of 1 means this event opened a new cycle.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read the count and reset it to zero in one step.
    pub fn drain(&self) -> u64 {
        self.count.swap(0, Ordering::SeqCst)
    }

    /// Get the current count without changing it.
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}
