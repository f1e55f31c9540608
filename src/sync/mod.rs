//! Demonstration synchronization primitives.
//!
//! Unlike RAII-guard locks, these expose explicit `acquire`/`release`
//! operations so that scenarios can acquire in one place and release in
//! another (or deliberately fail to release, for the deadlock demos).
//! Misuse is well-defined: releasing a lock you do not hold returns a
//! [`LockStateError`](crate::error::LockStateError) instead of being
//! undefined behavior.
//!
//! # Primitives
//!
//! - [`Mutex`]: at most one holder; a thread re-acquiring its own lock
//!   self-deadlocks.
//! - [`ReentrantLock`]: the owner may re-acquire freely; the lock frees
//!   only when the acquisition depth returns to zero.
//!
//! Both support a timed acquire that returns `false` once the timeout
//! elapses and leaves the lock untouched on failure.

mod mutex;
mod reentrant;

pub use mutex::Mutex;
pub use reentrant::ReentrantLock;
