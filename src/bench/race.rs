//! The race benchmark driver and its report types.

use serde::Serialize;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::counter::SharedCounter;
use crate::error::{LockStateError, ScenarioError};
use crate::sync::Mutex;

/// Benchmark knobs.
#[derive(Debug, Clone, Copy)]
pub struct BenchConfig {
    /// Increments performed by each worker per trial.
    pub iterations: u64,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Number of trials per mode; elapsed times are averaged across them.
    pub trials: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 100_000,
            workers: 2,
            trials: 10,
        }
    }
}

/// Aggregated results for one counter discipline.
#[derive(Debug, Clone, Serialize)]
pub struct ModeReport {
    /// Mean wall-clock elapsed time per trial.
    pub mean_elapsed: Duration,
    /// Smallest final counter value seen across trials.
    pub min_final: u64,
    /// Largest final counter value seen across trials.
    pub max_final: u64,
    /// Whether any trial finished below the expected count.
    pub lost_updates: bool,
}

/// Full benchmark report.
#[derive(Debug, Clone, Serialize)]
pub struct RaceBenchmarkReport {
    /// Increments per worker per trial.
    pub iterations: u64,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Trials run per mode.
    pub trials: usize,
    /// The correct final value: `workers * iterations`.
    pub expected: u64,
    /// Results without synchronization.
    pub unsynchronized: ModeReport,
    /// Results with every increment under the mutex.
    pub locked: ModeReport,
    /// Mean locked elapsed over mean unsynchronized elapsed.
    pub slowdown_ratio: f64,
}

impl fmt::Display for RaceBenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Race benchmark: {} workers x {} increments, {} trials (expected final: {})",
            self.workers, self.iterations, self.trials, self.expected
        )?;
        writeln!(
            f,
            "  unsynchronized: mean {:?}, final {}..{} ({})",
            self.unsynchronized.mean_elapsed,
            self.unsynchronized.min_final,
            self.unsynchronized.max_final,
            if self.unsynchronized.lost_updates {
                "lost updates observed"
            } else {
                "no loss observed this run"
            }
        )?;
        writeln!(
            f,
            "  mutex-guarded:  mean {:?}, final {}..{} ({})",
            self.locked.mean_elapsed,
            self.locked.min_final,
            self.locked.max_final,
            if self.locked.lost_updates {
                "LOST UPDATES - BUG"
            } else {
                "exact"
            }
        )?;
        write!(f, "  locking slowdown: {:.2}x", self.slowdown_ratio)
    }
}

/// Drives the unsynchronized and lock-guarded increment workloads.
#[derive(Debug)]
pub struct RaceBenchmark {
    config: BenchConfig,
}

impl RaceBenchmark {
    /// Creates a benchmark with the given configuration.
    #[must_use]
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    /// Runs both modes for the configured number of trials.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if a worker panics, fails to spawn, or
    /// hits a lock-state violation.
    pub fn run(&self) -> Result<RaceBenchmarkReport, ScenarioError> {
        // Zero trials or workers would make the means meaningless.
        let trials = self.config.trials.max(1);
        let workers = self.config.workers.max(1);
        let expected = workers as u64 * self.config.iterations;

        let lock = Mutex::new("bench-counter");

        let mut unsync_elapsed = Duration::ZERO;
        let mut unsync_finals = Vec::with_capacity(trials);
        let mut locked_elapsed = Duration::ZERO;
        let mut locked_finals = Vec::with_capacity(trials);

        for trial in 0..trials {
            let (elapsed, final_count) = self.run_trial(workers, None)?;
            tracing::debug!(
                trial,
                mode = "unsynchronized",
                ?elapsed,
                final_count,
                expected,
                "trial complete"
            );
            unsync_elapsed += elapsed;
            unsync_finals.push(final_count);

            let (elapsed, final_count) = self.run_trial(workers, Some(&lock))?;
            tracing::debug!(
                trial,
                mode = "locked",
                ?elapsed,
                final_count,
                expected,
                "trial complete"
            );
            locked_elapsed += elapsed;
            locked_finals.push(final_count);
        }

        let unsynchronized = mode_report(unsync_elapsed, trials, &unsync_finals, expected);
        let locked = mode_report(locked_elapsed, trials, &locked_finals, expected);
        let unsync_secs = unsynchronized.mean_elapsed.as_secs_f64();
        let slowdown_ratio = if unsync_secs > 0.0 {
            locked.mean_elapsed.as_secs_f64() / unsync_secs
        } else {
            f64::NAN
        };

        Ok(RaceBenchmarkReport {
            iterations: self.config.iterations,
            workers,
            trials,
            expected,
            unsynchronized,
            locked,
            slowdown_ratio,
        })
    }

    /// Runs one trial: `workers` threads each incrementing `iterations`
    /// times, with or without the guarding lock.
    fn run_trial(
        &self,
        workers: usize,
        guard: Option<&Mutex>,
    ) -> Result<(Duration, u64), ScenarioError> {
        let iterations = self.config.iterations;
        let counter = SharedCounter::new();
        let start = Instant::now();

        thread::scope(|scope| -> Result<(), ScenarioError> {
            let mut handles = Vec::with_capacity(workers);
            for index in 0..workers {
                let name = format!("bench-worker-{index}");
                let counter = &counter;
                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || -> Result<(), LockStateError> {
                        match guard {
                            Some(lock) => {
                                for _ in 0..iterations {
                                    lock.acquire();
                                    counter.increment();
                                    lock.release()?;
                                }
                            }
                            None => {
                                for _ in 0..iterations {
                                    counter.increment();
                                }
                            }
                        }
                        Ok(())
                    })
                    .map_err(|source| ScenarioError::Spawn {
                        worker: name.clone(),
                        source,
                    })?;
                handles.push((name, handle));
            }

            for (name, handle) in handles {
                match handle.join() {
                    Ok(result) => result?,
                    Err(_) => return Err(ScenarioError::WorkerPanicked { worker: name }),
                }
            }
            Ok(())
        })?;

        Ok((start.elapsed(), counter.get()))
    }
}

fn mode_report(total: Duration, trials: usize, finals: &[u64], expected: u64) -> ModeReport {
    #[allow(clippy::cast_possible_truncation)]
    let mean_elapsed = total / trials as u32;
    ModeReport {
        mean_elapsed,
        min_final: finals.iter().copied().min().unwrap_or(0),
        max_final: finals.iter().copied().max().unwrap_or(0),
        lost_updates: finals.iter().any(|&v| v < expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn small_config() -> BenchConfig {
        BenchConfig {
            iterations: 2_000,
            workers: 2,
            trials: 3,
        }
    }

    #[test]
    fn locked_mode_is_always_exact() {
        init_test("locked_mode_is_always_exact");
        let report = RaceBenchmark::new(small_config()).run().expect("benchmark runs");
        crate::assert_with_log!(
            report.locked.min_final == report.expected,
            "locked min exact",
            report.expected,
            report.locked.min_final
        );
        crate::assert_with_log!(
            report.locked.max_final == report.expected,
            "locked max exact",
            report.expected,
            report.locked.max_final
        );
        crate::assert_with_log!(
            !report.locked.lost_updates,
            "no locked loss",
            false,
            report.locked.lost_updates
        );
        crate::test_complete!("locked_mode_is_always_exact");
    }

    #[test]
    fn unsynchronized_mode_never_exceeds_expected() {
        init_test("unsynchronized_mode_never_exceeds_expected");
        let report = RaceBenchmark::new(small_config()).run().expect("benchmark runs");
        crate::assert_with_log!(
            report.unsynchronized.max_final <= report.expected,
            "unsync bounded above",
            report.expected,
            report.unsynchronized.max_final
        );
        crate::test_complete!("unsynchronized_mode_never_exceeds_expected");
    }

    #[test]
    fn report_shape_is_complete() {
        init_test("report_shape_is_complete");
        let config = BenchConfig {
            iterations: 100,
            workers: 2,
            trials: 2,
        };
        let report = RaceBenchmark::new(config).run().expect("benchmark runs");
        crate::assert_with_log!(report.expected == 200, "expected k*n", 200u64, report.expected);
        crate::assert_with_log!(report.trials == 2, "trials recorded", 2usize, report.trials);
        let text = report.to_string();
        crate::assert_with_log!(
            text.contains("Race benchmark"),
            "display header",
            true,
            text.contains("Race benchmark")
        );
        let json = serde_json::to_string(&report).expect("serializes");
        crate::assert_with_log!(
            json.contains("slowdown_ratio"),
            "json has ratio",
            true,
            json.contains("slowdown_ratio")
        );
        crate::test_complete!("report_shape_is_complete");
    }

    #[test]
    fn zero_trials_normalized_to_one() {
        init_test("zero_trials_normalized_to_one");
        let config = BenchConfig {
            iterations: 10,
            workers: 1,
            trials: 0,
        };
        let report = RaceBenchmark::new(config).run().expect("benchmark runs");
        crate::assert_with_log!(report.trials == 1, "trials clamped", 1usize, report.trials);
        crate::assert_with_log!(
            report.locked.min_final == 10,
            "single worker exact",
            10u64,
            report.locked.min_final
        );
        crate::test_complete!("zero_trials_normalized_to_one");
    }
}
