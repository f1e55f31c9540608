//! Crossed-lock-order deadlock scenario.
//!
//! Two workers acquire a pair of locks in opposite orders while holding
//! their first lock long enough to guarantee the cross. The plain variant
//! blocks on the second lock and never terminates (hold-and-wait
//! deadlock); the timeout variant gives one worker a timed acquire on its
//! second lock, which fails, logs a diagnostic, and releases the first
//! lock so the other worker can finish.

use serde::Serialize;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{LockStateError, ScenarioError};
use crate::sync::Mutex;

/// Per-worker progress states, recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    /// Worker thread started.
    Started,
    /// First lock acquired.
    HoldingFirst,
    /// Attempting the second lock.
    TryingSecond,
    /// Both locks held; the worker completes normally.
    HoldingBoth,
    /// Timed acquire of the second lock failed; first lock released.
    TimedOut,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::HoldingFirst => "holding-first",
            Self::TryingSecond => "trying-second",
            Self::HoldingBoth => "holding-both",
            Self::TimedOut => "timed-out",
        };
        write!(f, "{name}")
    }
}

/// Scenario knobs.
#[derive(Debug, Clone, Copy)]
pub struct DeadlockConfig {
    /// How long each worker holds its first lock before crossing. This is
    /// what makes the circular wait all but certain.
    pub hold_delay: Duration,
    /// Timed-acquire budget for the victim worker's second lock
    /// (timeout variant only).
    pub second_timeout: Duration,
}

impl Default for DeadlockConfig {
    fn default() -> Self {
        Self {
            hold_delay: Duration::from_millis(100),
            second_timeout: Duration::from_secs(2),
        }
    }
}

/// One ordered entry in the scenario event log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Time since scenario start.
    pub at: Duration,
    /// Worker name.
    pub worker: &'static str,
    /// The state the worker entered.
    pub state: WorkerState,
}

/// Outcome of the timeout variant.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlockReport {
    /// Final state per worker, in spawn order.
    pub outcomes: Vec<(&'static str, WorkerState)>,
    /// Number of workers that timed out on their second lock.
    pub timeouts: usize,
    /// Total scenario wall-clock time.
    pub elapsed: Duration,
    /// Ordered, timestamped state transitions from both workers.
    pub events: Vec<LogEntry>,
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deadlock scenario: completed in {:?} with {} timeout(s)",
            self.elapsed, self.timeouts
        )?;
        for (worker, state) in &self.outcomes {
            writeln!(f, "  {worker}: {state}")?;
        }
        writeln!(f, "  events:")?;
        for entry in &self.events {
            writeln!(f, "    [{:>9?}] {} {}", entry.at, entry.worker, entry.state)?;
        }
        Ok(())
    }
}

/// Ordered event log shared by the scenario's workers.
#[derive(Debug)]
struct EventLog {
    start: Instant,
    entries: parking_lot::Mutex<Vec<LogEntry>>,
}

impl EventLog {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            entries: parking_lot::Mutex::new(Vec::new()),
        }
    }

    fn record(&self, worker: &'static str, state: WorkerState) {
        // Stamp while holding the entries lock so push order and
        // timestamp order agree; stamping first lets a descheduled
        // recorder push an earlier stamp after a later one.
        let mut entries = self.entries.lock();
        let at = self.start.elapsed();
        tracing::debug!(worker, state = %state, at = ?at, "state change");
        entries.push(LogEntry { at, worker, state });
    }

    fn into_entries(self) -> Vec<LogEntry> {
        self.entries.into_inner()
    }
}

/// The crossed-lock-order scenario. Owns the lock pair; workers borrow it.
#[derive(Debug)]
pub struct DeadlockScenario {
    config: DeadlockConfig,
    alpha: Mutex,
    beta: Mutex,
}

impl DeadlockScenario {
    /// Creates the scenario with a fresh pair of named locks.
    #[must_use]
    pub fn new(config: DeadlockConfig) -> Self {
        Self {
            config,
            alpha: Mutex::new("alpha"),
            beta: Mutex::new("beta"),
        }
    }

    /// Runs the plain variant: both workers block on their second lock.
    ///
    /// With the default configuration this deadlocks and **never
    /// returns**. A liveness loop logs the stuck workers once per second
    /// so the hang is visible; recovery requires killing the process
    /// (documented limitation, not a bug). The return path exists only
    /// for the (timing-dependent, practically unreachable) case where one
    /// worker finishes both locks before the other starts.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if a worker panics or fails to spawn —
    /// only reachable if the deadlock does not manifest.
    pub fn run_plain(&self) -> Result<DeadlockReport, ScenarioError> {
        self.run(None)
    }

    /// Runs the timeout variant: the victim worker uses a timed acquire
    /// on its second lock and recovers by releasing its first.
    ///
    /// Terminates within `hold_delay + second_timeout` plus scheduling
    /// slack, and the report carries exactly one timed-out worker when
    /// the circular wait manifested (which the hold delay guarantees in
    /// practice).
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if a worker panics, fails to spawn, or
    /// hits a lock-state violation.
    pub fn run_with_timeout(&self) -> Result<DeadlockReport, ScenarioError> {
        self.run(Some(self.config.second_timeout))
    }

    fn run(&self, victim_timeout: Option<Duration>) -> Result<DeadlockReport, ScenarioError> {
        let log = EventLog::new();
        let start = Instant::now();
        let hold = self.config.hold_delay;

        let (outcome_a, outcome_b) = thread::scope(|scope| {
            let worker_a = spawn_worker(scope, "worker-a", &self.alpha, &self.beta, hold, None, &log)?;
            // In the plain variant (victim_timeout == None) worker-b
            // blocks on its second lock just like worker-a.
            let worker_b = spawn_worker(
                scope,
                "worker-b",
                &self.beta,
                &self.alpha,
                hold,
                victim_timeout,
                &log,
            )?;

            // Liveness monitor for the plain variant: under deadlock this
            // loop runs forever, reporting the stuck workers once a second.
            if victim_timeout.is_none() {
                while !worker_a.is_finished() || !worker_b.is_finished() {
                    thread::sleep(Duration::from_secs(1));
                    if !worker_a.is_finished() {
                        tracing::debug!(worker = "worker-a", "still blocked");
                    }
                    if !worker_b.is_finished() {
                        tracing::debug!(worker = "worker-b", "still blocked");
                    }
                }
            }

            let outcome_a = join_worker("worker-a", worker_a)?;
            let outcome_b = join_worker("worker-b", worker_b)?;
            Ok::<_, ScenarioError>((outcome_a, outcome_b))
        })?;

        let outcomes = vec![("worker-a", outcome_a), ("worker-b", outcome_b)];
        let timeouts = outcomes
            .iter()
            .filter(|(_, state)| *state == WorkerState::TimedOut)
            .count();

        Ok(DeadlockReport {
            outcomes,
            timeouts,
            elapsed: start.elapsed(),
            events: log.into_entries(),
        })
    }
}

fn spawn_worker<'scope, 'env>(
    scope: &'scope thread::Scope<'scope, 'env>,
    name: &'static str,
    first: &'scope Mutex,
    second: &'scope Mutex,
    hold_delay: Duration,
    second_wait: Option<Duration>,
    log: &'scope EventLog,
) -> Result<thread::ScopedJoinHandle<'scope, Result<WorkerState, LockStateError>>, ScenarioError> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn_scoped(scope, move || {
            cross_worker(name, first, second, hold_delay, second_wait, log)
        })
        .map_err(|source| ScenarioError::Spawn {
            worker: name.to_string(),
            source,
        })
}

fn join_worker(
    name: &'static str,
    handle: thread::ScopedJoinHandle<'_, Result<WorkerState, LockStateError>>,
) -> Result<WorkerState, ScenarioError> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(ScenarioError::WorkerPanicked {
            worker: name.to_string(),
        }),
    }
}

/// One side of the crossed acquisition: take `first`, hold it, then go
/// for `second` — blocking if `second_wait` is `None`, timed otherwise.
fn cross_worker(
    name: &'static str,
    first: &Mutex,
    second: &Mutex,
    hold_delay: Duration,
    second_wait: Option<Duration>,
    log: &EventLog,
) -> Result<WorkerState, LockStateError> {
    log.record(name, WorkerState::Started);

    first.acquire();
    log.record(name, WorkerState::HoldingFirst);
    tracing::debug!(worker = name, lock = first.name(), "acquired lock");

    thread::sleep(hold_delay);

    log.record(name, WorkerState::TryingSecond);
    tracing::debug!(worker = name, lock = second.name(), "trying to acquire lock");

    let acquired = match second_wait {
        None => {
            second.acquire();
            true
        }
        Some(timeout) => second.try_acquire(Some(timeout)),
    };

    let state = if acquired {
        log.record(name, WorkerState::HoldingBoth);
        tracing::debug!(
            worker = name,
            first = first.name(),
            second = second.name(),
            "acquired both locks"
        );
        second.release()?;
        WorkerState::HoldingBoth
    } else {
        tracing::error!(
            worker = name,
            lock = second.name(),
            "could not acquire lock: potential deadlock"
        );
        log.record(name, WorkerState::TimedOut);
        WorkerState::TimedOut
    };

    // Releasing the first lock is what unblocks the other worker after a
    // timeout.
    first.release()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn quick_config() -> DeadlockConfig {
        DeadlockConfig {
            hold_delay: Duration::from_millis(50),
            second_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn timeout_variant_recovers_with_one_timeout() {
        init_test("timeout_variant_recovers_with_one_timeout");
        let scenario = DeadlockScenario::new(quick_config());
        let report = scenario.run_with_timeout().expect("scenario completes");

        crate::assert_with_log!(report.timeouts == 1, "one timeout", 1usize, report.timeouts);
        let survivor_completed = report
            .outcomes
            .iter()
            .any(|(_, state)| *state == WorkerState::HoldingBoth);
        crate::assert_with_log!(survivor_completed, "survivor completes", true, survivor_completed);
        crate::test_complete!("timeout_variant_recovers_with_one_timeout");
    }

    #[test]
    fn timeout_variant_terminates_within_bound() {
        init_test("timeout_variant_terminates_within_bound");
        let config = quick_config();
        let scenario = DeadlockScenario::new(config);
        let report = scenario.run_with_timeout().expect("scenario completes");

        // hold_delay + second_timeout plus generous scheduling slack.
        let bound = config.hold_delay + config.second_timeout + Duration::from_secs(2);
        crate::assert_with_log!(
            report.elapsed < bound,
            "bounded termination",
            bound,
            report.elapsed
        );
        crate::test_complete!("timeout_variant_terminates_within_bound");
    }

    #[test]
    fn event_log_is_ordered_and_complete() {
        init_test("event_log_is_ordered_and_complete");
        let scenario = DeadlockScenario::new(quick_config());
        let report = scenario.run_with_timeout().expect("scenario completes");

        // Both workers log Started, HoldingFirst, TryingSecond plus a
        // terminal state: at least eight entries in monotonic time order.
        crate::assert_with_log!(
            report.events.len() >= 8,
            "all transitions logged",
            8usize,
            report.events.len()
        );
        let ordered = report.events.windows(2).all(|pair| pair[0].at <= pair[1].at);
        crate::assert_with_log!(ordered, "timestamps monotonic", true, ordered);

        let timed_out_events = report
            .events
            .iter()
            .filter(|entry| entry.state == WorkerState::TimedOut)
            .count();
        crate::assert_with_log!(
            timed_out_events == 1,
            "one timed-out event",
            1usize,
            timed_out_events
        );
        crate::test_complete!("event_log_is_ordered_and_complete");
    }

    #[test]
    fn event_log_stays_ordered_under_contention() {
        init_test("event_log_stays_ordered_under_contention");
        let log = EventLog::new();

        thread::scope(|scope| {
            for index in 0..2 {
                let log = &log;
                thread::Builder::new()
                    .name(format!("recorder-{index}"))
                    .spawn_scoped(scope, move || {
                        for _ in 0..5_000 {
                            log.record("recorder", WorkerState::Started);
                        }
                    })
                    .expect("spawn recorder");
            }
        });

        let entries = log.into_entries();
        crate::assert_with_log!(
            entries.len() == 10_000,
            "all records kept",
            10_000usize,
            entries.len()
        );
        let inversion = entries
            .windows(2)
            .position(|pair| pair[0].at > pair[1].at);
        crate::assert_with_log!(
            inversion.is_none(),
            "timestamps agree with push order",
            None::<usize>,
            inversion
        );
        crate::test_complete!("event_log_stays_ordered_under_contention");
    }

    #[test]
    fn locks_are_free_after_recovery() {
        init_test("locks_are_free_after_recovery");
        let scenario = DeadlockScenario::new(quick_config());
        scenario.run_with_timeout().expect("scenario completes");
        crate::assert_with_log!(
            !scenario.alpha.is_locked(),
            "alpha released",
            false,
            scenario.alpha.is_locked()
        );
        crate::assert_with_log!(
            !scenario.beta.is_locked(),
            "beta released",
            false,
            scenario.beta.is_locked()
        );
        crate::test_complete!("locks_are_free_after_recovery");
    }
}
