//! Recursive critical sections: the reentrancy contrast.
//!
//! [`recursive_traverse`] acquires a [`ReentrantLock`] once per recursion
//! level and unwinds cleanly; [`recursive_traverse_self_lock`] does the
//! same over a plain [`Mutex`] and blocks on itself forever for any
//! recursion depth above zero. The pair is the didactic core of the
//! harness: the same shape of code, one safe and one self-deadlocking.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use crate::error::LockStateError;
use crate::sync::{Mutex, ReentrantLock};

/// Report for a completed reentrant traversal.
#[derive(Debug, Clone, Serialize)]
pub struct ReentrantDemoReport {
    /// Requested recursion depth.
    pub depth: u32,
    /// Deepest acquisition depth observed (`depth + 1`: one acquire per
    /// level, including level zero).
    pub max_depth_observed: u32,
    /// Wall-clock time for the full traversal.
    pub elapsed: Duration,
}

impl fmt::Display for ReentrantDemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reentrant demo: traversed to depth {} (lock depth peaked at {}) in {:?}",
            self.depth, self.max_depth_observed, self.elapsed
        )
    }
}

/// Recursively acquires `lock` once per level, down to depth zero.
///
/// Each level re-acquires the lock the caller already owns, so the
/// acquisition depth grows to `depth + 1` before unwinding. Completes
/// without blocking. Returns the deepest acquisition depth observed.
///
/// # Errors
///
/// Propagates [`LockStateError`] from an unbalanced release; with a fresh
/// lock this does not occur.
pub fn recursive_traverse(lock: &ReentrantLock, depth: u32) -> Result<u32, LockStateError> {
    tracing::debug!(lock = lock.name(), depth, "calling function");
    lock.acquire();
    let here = lock.held_depth();
    let deepest = if depth > 0 {
        recursive_traverse(lock, depth - 1)?.max(here)
    } else {
        here
    };
    lock.release()?;
    Ok(deepest)
}

/// The non-reentrant counterpart: recursion over a plain [`Mutex`].
///
/// For `depth == 0` this is a plain acquire/release and completes. For
/// any `depth > 0` the first recursive call blocks forever on the lock
/// its own caller holds — the self-deadlock this harness demonstrates.
/// Callers that exercise the hazard must impose an external timeout.
///
/// # Errors
///
/// Propagates [`LockStateError`] from an unbalanced release.
pub fn recursive_traverse_self_lock(lock: &Mutex, depth: u32) -> Result<(), LockStateError> {
    tracing::debug!(lock = lock.name(), depth, "calling function");
    lock.acquire();
    if depth > 0 {
        recursive_traverse_self_lock(lock, depth - 1)?;
    }
    lock.release()
}

/// Runs the safe variant to the given depth and reports on it.
///
/// # Errors
///
/// Propagates [`LockStateError`]; does not occur with the fresh lock this
/// constructs.
pub fn run(depth: u32) -> Result<ReentrantDemoReport, LockStateError> {
    let lock = ReentrantLock::new("traverse");
    let start = Instant::now();
    let max_depth_observed = recursive_traverse(&lock, depth)?;
    let elapsed = start.elapsed();

    debug_assert_eq!(lock.held_depth(), 0, "traversal must fully unwind");
    tracing::debug!(depth, max_depth_observed, ?elapsed, "traversal complete");

    Ok(ReentrantDemoReport {
        depth,
        max_depth_observed,
        elapsed,
    })
}
