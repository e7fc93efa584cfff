//! External tool adapters: type checker, test executor, and linter.
//!
//! Each adapter writes its input into a fresh scratch directory, runs the
//! configured command with the file path appended, and parses the output.
//! The scratch directory is removed when the call returns, on every path.

pub mod executor;
pub mod lint;
pub mod process;
pub mod tsc;

pub use executor::{CommandExecutor, TestExecutor, TestUnit};
pub use lint::{EslintLinter, Linter};
pub use process::{ExecutionOutput, first_error_line};
pub use tsc::{TscChecker, TypeCheckReport, TypeChecker};

/// Errors from running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool command is empty")]
    EmptyCommand,
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scratch file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The tool ran but its output cannot be interpreted.
    #[error("'{command}' failed (exit {exit_code:?}): {message}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },
}
