//! Shared counter with a deliberately racy increment.

use std::sync::atomic::{AtomicU64, Ordering};

/// A shared counter whose increment is a two-step read-modify-write.
///
/// `increment` loads the value and stores `value + 1` as two separate
/// relaxed atomic operations. Concurrent unsynchronized callers can
/// interleave between the load and the store and overwrite each other's
/// update, exactly like an unguarded `counter += 1` — without the
/// undefined behavior a true data race would be in Rust. When callers
/// serialize through a lock, the same operation counts exactly.
///
/// Whether a run uses the lock is a property of the scenario
/// configuration; the two disciplines are never mixed within one run.
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: AtomicU64,
}

impl SharedCounter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increments the counter by one, non-atomically on purpose.
    ///
    /// A plain `fetch_add` would make the unsynchronized benchmark mode
    /// correct and defeat the demonstration; the split load/store is the
    /// lost-update hazard under test.
    pub fn increment(&self) {
        let current = self.value.load(Ordering::Relaxed);
        self.value.store(current + 1, Ordering::Relaxed);
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Resets the counter to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}
