//! Optional style/quality linting.

use crate::ToolError;
use crate::process::{Scratch, first_error_line, run_tool};
use async_trait::async_trait;
use fnsynth_core::config::ToolsConfig;
use regex::Regex;
use std::sync::OnceLock;

/// Linter collaborator. Findings are advisory and never block the pipeline.
#[async_trait]
pub trait Linter: Send + Sync {
    async fn lint(&self, code: &str) -> Result<Vec<String>, ToolError>;
}

/// Runs an ESLint-compatible command with `--format unix` output.
pub struct EslintLinter {
    command: String,
}

impl EslintLinter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// `None` when no linter command is configured.
    pub fn from_config(config: &ToolsConfig) -> Option<Self> {
        let command = config.linter.trim();
        (!command.is_empty()).then(|| Self::new(command))
    }
}

#[async_trait]
impl Linter for EslintLinter {
    async fn lint(&self, code: &str) -> Result<Vec<String>, ToolError> {
        let scratch = Scratch::with_file("candidate.ts", code).await?;
        let output = run_tool(&self.command, &scratch.file(), scratch.dir()).await?;

        let findings = parse_unix_format(&output.stdout);
        // eslint exits 1 when it reports findings and 2 on a crash.
        if findings.is_empty() && output.exit_code.is_some_and(|c| c > 1) {
            return Err(ToolError::Failed {
                command: self.command.clone(),
                exit_code: output.exit_code,
                message: first_error_line(&output.combined()),
            });
        }
        Ok(findings)
    }
}

/// Parse `path:line:col: message [Severity/rule]` lines into `line:col message` strings.
pub fn parse_unix_format(output: &str) -> Vec<String> {
    static UNIX_RE: OnceLock<Regex> = OnceLock::new();
    let re = UNIX_RE.get_or_init(|| Regex::new(r"^.+?:(\d+):(\d+):\s*(.+)$").unwrap());

    output
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim())?;
            Some(format!("{}:{} {}", &caps[1], &caps[2], caps[3].trim()))
        })
        .collect()
}
