//! Mutual-exclusion lock with blocking and timed acquire.
//!
//! The lock tracks its owner so that `release` by a non-owner is a typed
//! error rather than silent corruption. It is deliberately *not*
//! reentrant: a thread that calls [`Mutex::acquire`] on a lock it already
//! holds blocks on itself forever. That hazard is the didactic contrast
//! with [`ReentrantLock`](super::ReentrantLock).
//!
//! # Example
//!
//! ```
//! use locklab::sync::Mutex;
//!
//! let lock = Mutex::new("demo");
//! lock.acquire();
//! // ... critical section ...
//! lock.release().expect("held by this thread");
//! ```

use parking_lot::{Condvar, Mutex as ParkingMutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::error::LockStateError;

#[derive(Debug)]
struct MutexState {
    /// Whether the lock is currently held.
    locked: bool,
    /// The thread that holds it, for release validation.
    owner: Option<ThreadId>,
}

/// A named mutual-exclusion lock.
///
/// Acquisition and release are the sole points of visibility
/// synchronization for state guarded by this lock; guarded reads and
/// writes must happen only while the lock is held.
#[derive(Debug)]
pub struct Mutex {
    /// Human-readable name, used in log lines and error messages.
    name: &'static str,
    /// Internal state, guarded by a raw mutex paired with `cond`.
    state: ParkingMutex<MutexState>,
    cond: Condvar,
}

impl Mutex {
    /// Creates a new unlocked mutex with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ParkingMutex::new(MutexState {
                locked: false,
                owner: None,
            }),
            cond: Condvar::new(),
        }
    }

    /// Returns the lock name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if the lock is currently held by some thread.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Blocks the calling thread until the lock is free, then takes it.
    ///
    /// Calling this on a lock the current thread already holds blocks
    /// forever (the lock is not reentrant).
    pub fn acquire(&self) {
        let mut state = self.state.lock();
        while state.locked {
            self.cond.wait(&mut state);
        }
        state.locked = true;
        state.owner = Some(thread::current().id());
    }

    /// Attempts to take the lock within `timeout`.
    ///
    /// - `Some(Duration::ZERO)` is a non-blocking probe.
    /// - `Some(t)` waits up to `t`; returns `false` strictly after `t`
    ///   elapses, with bounded overshoot, leaving the lock untouched.
    /// - `None` waits without bound and always returns `true`.
    #[must_use]
    pub fn try_acquire(&self, timeout: Option<Duration>) -> bool {
        let Some(timeout) = timeout else {
            self.acquire();
            return true;
        };

        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.locked {
            if timeout.is_zero() {
                return false;
            }
            if self.cond.wait_until(&mut state, deadline).timed_out() && state.locked {
                return false;
            }
        }
        state.locked = true;
        state.owner = Some(thread::current().id());
        true
    }

    /// Releases the lock and wakes at most one blocked waiter.
    ///
    /// Wake order is unspecified (FIFO-preferred under `parking_lot`, but
    /// not guaranteed).
    ///
    /// # Errors
    ///
    /// [`LockStateError::NotHeld`] if the lock is free;
    /// [`LockStateError::NotOwner`] if another thread holds it.
    pub fn release(&self) -> Result<(), LockStateError> {
        let mut state = self.state.lock();
        if !state.locked {
            return Err(LockStateError::NotHeld { lock: self.name });
        }
        if state.owner != Some(thread::current().id()) {
            return Err(LockStateError::NotOwner { lock: self.name });
        }
        state.locked = false;
        state.owner = None;
        // Wake outside the state lock so the woken thread can take it
        // without an immediate collision.
        drop(state);
        self.cond.notify_one();
        Ok(())
    }
}
