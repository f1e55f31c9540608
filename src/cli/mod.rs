//! CLI support: semantic exit codes and error-to-exit-code mapping.

pub mod exit;

pub use exit::ExitCode;

use crate::error::ScenarioError;

/// Maps a scenario error to its semantic exit code.
#[must_use]
pub fn exit_code_for(error: &ScenarioError) -> i32 {
    match error {
        ScenarioError::WorkerPanicked { .. } | ScenarioError::Spawn { .. } => {
            ExitCode::WORKER_FAILURE
        }
        ScenarioError::LockState(_) => ExitCode::RUNTIME_ERROR,
    }
}
