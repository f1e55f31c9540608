//! Semantic exit codes for the locklab CLI.
//!
//! Exit codes follow common conventions and are in the valid range (0-125).
//! Codes 126-255 are reserved by shells for special purposes.

/// Semantic exit codes for the CLI.
///
/// These follow common conventions and provide machine-readable status.
/// All codes are in the valid range (0-125).
pub struct ExitCode;

impl ExitCode {
    /// Success - scenario completed without errors.
    pub const SUCCESS: i32 = 0;

    /// User error - bad arguments or invalid configuration.
    pub const USER_ERROR: i32 = 1;

    /// Runtime error - a scenario hit a lock-state violation.
    pub const RUNTIME_ERROR: i32 = 2;

    // Application-specific codes (10-125)

    /// Worker failure - a worker thread panicked or failed to spawn.
    pub const WORKER_FAILURE: i32 = 10;

    /// Get human-readable description of an exit code.
    #[must_use]
    pub const fn description(code: i32) -> &'static str {
        match code {
            0 => "success",
            1 => "user error (invalid input/arguments)",
            2 => "runtime error (lock-state violation)",
            10 => "worker failure (panic or spawn error)",
            _ => "unknown",
        }
    }

    /// Check if an exit code indicates success (code 0).
    #[must_use]
    pub const fn is_success(code: i32) -> bool {
        code == Self::SUCCESS
    }

    /// Check if an exit code indicates any kind of failure (non-zero).
    #[must_use]
    pub const fn is_failure(code: i32) -> bool {
        code != Self::SUCCESS
    }
}
