//! Error types for the demonstration locks and scenario drivers.
//!
//! Error handling follows two rules:
//!
//! - Lock-state violations are programming errors. They are typed, surfaced
//!   to the caller immediately, and never retried.
//! - Timing out while waiting for a lock is not an error at all. Timed
//!   acquire returns `false`; no `LockStateError` variant exists for it.

use core::fmt;

/// A lock operation that violated the lock's state invariants.
///
/// The informal demos this harness is modeled on leave these cases
/// undefined ("erroneous"); here they are explicit and well-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStateError {
    /// `release` was called on a lock that nothing holds.
    NotHeld {
        /// Name of the lock, assigned at construction.
        lock: &'static str,
    },
    /// `release` was called by a thread that is not the current owner.
    NotOwner {
        /// Name of the lock, assigned at construction.
        lock: &'static str,
    },
    /// A reentrant `release` was attempted with the depth already at zero.
    ZeroDepth {
        /// Name of the lock, assigned at construction.
        lock: &'static str,
    },
}

impl LockStateError {
    /// Returns the name of the lock the violation occurred on.
    #[must_use]
    pub const fn lock_name(&self) -> &'static str {
        match self {
            Self::NotHeld { lock } | Self::NotOwner { lock } | Self::ZeroDepth { lock } => lock,
        }
    }
}

impl fmt::Display for LockStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHeld { lock } => write!(f, "lock '{lock}' released while not held"),
            Self::NotOwner { lock } => {
                write!(f, "lock '{lock}' released by a thread that does not own it")
            }
            Self::ZeroDepth { lock } => {
                write!(f, "reentrant lock '{lock}' released at depth zero")
            }
        }
    }
}

impl std::error::Error for LockStateError {}

/// A scenario run that failed to complete cleanly.
#[derive(Debug)]
pub enum ScenarioError {
    /// A worker thread panicked; the driver joined it and captured the name.
    WorkerPanicked {
        /// Name of the worker thread that panicked.
        worker: String,
    },
    /// A worker could not be spawned.
    Spawn {
        /// Name of the worker thread that failed to start.
        worker: String,
        /// The underlying OS error.
        source: std::io::Error,
    },
    /// A worker hit a lock-state violation.
    LockState(LockStateError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkerPanicked { worker } => write!(f, "worker '{worker}' panicked"),
            Self::Spawn { worker, source } => {
                write!(f, "failed to spawn worker '{worker}': {source}")
            }
            Self::LockState(err) => write!(f, "lock state violation: {err}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::LockState(err) => Some(err),
            Self::WorkerPanicked { .. } => None,
        }
    }
}

impl From<LockStateError> for ScenarioError {
    fn from(err: LockStateError) -> Self {
        Self::LockState(err)
    }
}
