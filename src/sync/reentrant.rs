//! Reentrant lock tracked by per-owner acquisition depth.
//!
//! The current owner may re-acquire without blocking; each re-acquire
//! increments the depth and each release decrements it. Other threads see
//! the lock as held until the depth returns to zero. This is what makes
//! recursive critical sections safe, where a plain [`Mutex`](super::Mutex)
//! would block on itself.

use parking_lot::{Condvar, Mutex as ParkingMutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::error::LockStateError;

#[derive(Debug)]
struct ReentrantState {
    /// The owning thread. Invariant: `Some` iff `depth > 0`.
    owner: Option<ThreadId>,
    /// Number of unmatched acquires by the owner.
    depth: u32,
}

/// A named lock that its owner may re-acquire without blocking.
#[derive(Debug)]
pub struct ReentrantLock {
    name: &'static str,
    state: ParkingMutex<ReentrantState>,
    cond: Condvar,
}

impl ReentrantLock {
    /// Creates a new unheld reentrant lock with the given name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ParkingMutex::new(ReentrantState {
                owner: None,
                depth: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Returns the lock name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the calling thread's current acquisition depth.
    ///
    /// Zero if the caller does not own the lock, including when another
    /// thread holds it.
    #[must_use]
    pub fn held_depth(&self) -> u32 {
        let state = self.state.lock();
        if state.owner == Some(thread::current().id()) {
            state.depth
        } else {
            0
        }
    }

    /// Returns true if any thread currently owns the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Acquires the lock, blocking if another thread owns it.
    ///
    /// If the calling thread already owns the lock this increments the
    /// depth and returns immediately.
    pub fn acquire(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.owner == Some(me) {
            state.depth += 1;
            return;
        }
        while state.owner.is_some() {
            self.cond.wait(&mut state);
        }
        state.owner = Some(me);
        state.depth = 1;
    }

    /// Attempts to acquire the lock within `timeout`.
    ///
    /// The owner's reentrant fast path always succeeds immediately. For
    /// other threads the timeout semantics match
    /// [`Mutex::try_acquire`](super::Mutex::try_acquire): `Some(0)` probes,
    /// `None` waits without bound, and a `false` result leaves the lock
    /// untouched.
    #[must_use]
    pub fn try_acquire(&self, timeout: Option<Duration>) -> bool {
        let me = thread::current().id();
        let Some(timeout) = timeout else {
            self.acquire();
            return true;
        };

        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        if state.owner == Some(me) {
            state.depth += 1;
            return true;
        }
        while state.owner.is_some() {
            if timeout.is_zero() {
                return false;
            }
            if self.cond.wait_until(&mut state, deadline).timed_out() && state.owner.is_some() {
                return false;
            }
        }
        state.owner = Some(me);
        state.depth = 1;
        true
    }

    /// Releases one level of the lock.
    ///
    /// The lock is freed, and at most one waiter woken, only when the
    /// depth returns to zero.
    ///
    /// # Errors
    ///
    /// [`LockStateError::ZeroDepth`] if the lock is unheld;
    /// [`LockStateError::NotOwner`] if another thread owns it.
    pub fn release(&self) -> Result<(), LockStateError> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        match state.owner {
            None => Err(LockStateError::ZeroDepth { lock: self.name }),
            Some(owner) if owner != me => Err(LockStateError::NotOwner { lock: self.name }),
            Some(_) => {
                state.depth -= 1;
                if state.depth == 0 {
                    state.owner = None;
                    drop(state);
                    self.cond.notify_one();
                }
                Ok(())
            }
        }
    }
}
