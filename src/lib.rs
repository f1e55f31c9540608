//! Lock-behavior demonstration harness.
//!
//! Locklab models the classic failure modes of shared-memory concurrency
//! and the primitives that prevent them:
//!
//! - [`sync::Mutex`]: mutual exclusion with blocking and timed acquire.
//! - [`sync::ReentrantLock`]: re-acquirable by its owner, tracked by depth.
//! - [`bench::RaceBenchmark`]: unsynchronized vs. lock-guarded increment
//!   throughput and correctness.
//! - [`scenario::DeadlockScenario`]: crossed-lock-order hold-and-wait
//!   deadlock, plus the timed-acquire recovery that breaks it.
//! - [`scenario::reentrant_demo`]: recursive critical sections that
//!   self-deadlock on a plain mutex and complete on a reentrant one.
//!
//! # Error handling
//!
//! Lock-state violations (releasing a lock you do not hold) are programming
//! errors and surface immediately as [`error::LockStateError`]. Acquire
//! timeouts are expected control flow and are returned as `bool`, never as
//! errors. Worker panics are joined by the scenario driver and reported as
//! [`error::ScenarioError::WorkerPanicked`].
//!
//! # Logging
//!
//! Scenarios emit `tracing` events; the `locklab` binary installs a
//! subscriber that prefixes each line with elapsed time since start and the
//! worker thread name, so interleavings are visible in the output.

#![forbid(unsafe_code)]

pub mod bench;
pub mod cli;
pub mod counter;
pub mod error;
pub mod scenario;
pub mod sync;
pub mod test_utils;

pub use counter::SharedCounter;
pub use error::{LockStateError, ScenarioError};
pub use sync::{Mutex, ReentrantLock};
