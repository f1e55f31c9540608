//! Throughput and correctness comparison of counter disciplines.
//!
//! The benchmark runs the same increment workload twice per trial — once
//! with no synchronization and once with every increment guarded by a
//! [`Mutex`](crate::sync::Mutex) — and reports mean elapsed times, final
//! counter values, and the locking slowdown ratio. The unsynchronized
//! mode's lost updates are the measured property, not a bug.

mod race;

pub use race::{BenchConfig, ModeReport, RaceBenchmark, RaceBenchmarkReport};
