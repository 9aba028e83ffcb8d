//! Exit code constants for the lorewright CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Run paused or completed |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `GENERATION_ERROR` | The pipeline returned an `ERROR` status |
//! | 4 | `STATE_PERSISTENCE` | Saved state missing or unreadable |

/// Type-safe process exit code.
///
/// ```rust
/// use lorewright_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(2), ExitCode::CLI_ARGS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - the run paused or completed
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - unexpected failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// The orchestrator reported an ERROR status
    pub const GENERATION_ERROR: ExitCode = ExitCode(3);

    /// Checkpoint could not be found, read or written
    pub const STATE_PERSISTENCE: ExitCode = ExitCode(4);

    /// Create an exit code from a raw integer value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Numeric value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::GENERATION_ERROR.as_i32(), 3);
        assert_eq!(ExitCode::STATE_PERSISTENCE.as_i32(), 4);
        assert_eq!(i32::from(ExitCode::CLI_ARGS), 2);
    }
}
