//! Scenario drivers.
//!
//! Each scenario constructs its own locks and shared state, spawns named
//! worker threads that borrow them, waits for completion (where completion
//! is possible), and produces a serializable report with an ordered,
//! timestamped event log.

pub mod deadlock;
pub mod reentrant_demo;

pub use deadlock::{DeadlockConfig, DeadlockReport, DeadlockScenario, WorkerState};
pub use reentrant_demo::ReentrantDemoReport;
