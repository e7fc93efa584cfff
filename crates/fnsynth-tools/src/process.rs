//! Running a configured command against a scratch file.

use crate::ToolError;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;

/// Captured output of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl ExecutionOutput {
    /// Stdout and stderr joined, for scanning.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A scratch directory holding one input file. Deleted on drop.
pub(crate) struct Scratch {
    dir: TempDir,
    file_name: &'static str,
}

impl Scratch {
    /// Create a fresh directory and write `contents` into `file_name`.
    pub(crate) async fn with_file(
        file_name: &'static str,
        contents: &str,
    ) -> Result<Self, ToolError> {
        let dir = tempfile::Builder::new().prefix("fnsynth-").tempdir()?;
        tokio::fs::write(dir.path().join(file_name), contents).await?;
        Ok(Self { dir, file_name })
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn file(&self) -> std::path::PathBuf {
        self.dir.path().join(self.file_name)
    }
}

/// Run `command` (split on whitespace) with `file` appended, inside `cwd`.
///
/// A non-zero exit is not an error here; callers interpret it. Only a
/// failure to start the process is.
pub(crate) async fn run_tool(
    command: &str,
    file: &Path,
    cwd: &Path,
) -> Result<ExecutionOutput, ToolError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or(ToolError::EmptyCommand)?;

    let start = Instant::now();
    let output = tokio::process::Command::new(program)
        .args(parts)
        .arg(file)
        .current_dir(cwd)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ToolError::Launch {
            command: command.to_string(),
            source,
        })?;

    let execution = ExecutionOutput {
        command: command.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    tracing::debug!(
        command,
        exit_code = ?execution.exit_code,
        duration_ms = execution.duration_ms,
        "tool finished"
    );
    Ok(execution)
}

/// First line that looks like an error report, trimmed.
pub fn first_error_line(text: &str) -> String {
    text.lines()
        .find(|l| {
            let l = l.to_lowercase();
            l.contains("error") || l.contains("failed") || l.contains("cannot")
        })
        .map_or_else(|| "execution failed".to_string(), |s| s.trim().to_string())
}
