//! Test unit execution.

use crate::ToolError;
use crate::process::{ExecutionOutput, Scratch, run_tool};
use async_trait::async_trait;
use fnsynth_core::config::ToolsConfig;

/// A self-contained executable test program: candidate code plus harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    pub source: String,
    /// Case names in harness order.
    pub case_names: Vec<String>,
}

/// Test executor collaborator. Its output format is free text.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn run(&self, unit: &TestUnit) -> Result<ExecutionOutput, ToolError>;
}

/// Runs a TypeScript runner command (`tsx`, `ts-node`, `deno run`) on the unit.
pub struct CommandExecutor {
    command: String,
}

impl CommandExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(config.executor.clone())
    }
}

#[async_trait]
impl TestExecutor for CommandExecutor {
    async fn run(&self, unit: &TestUnit) -> Result<ExecutionOutput, ToolError> {
        let scratch = Scratch::with_file("unit.test.ts", &unit.source).await?;
        let output = run_tool(&self.command, &scratch.file(), scratch.dir()).await?;
        tracing::info!(
            cases = unit.case_names.len(),
            exit_code = ?output.exit_code,
            duration_ms = output.duration_ms,
            "test unit executed"
        );
        Ok(output)
    }
}
