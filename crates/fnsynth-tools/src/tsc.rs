//! Type checking through `tsc`.

use crate::ToolError;
use crate::process::{Scratch, first_error_line, run_tool};
use async_trait::async_trait;
use fnsynth_core::config::ToolsConfig;
use fnsynth_core::{Severity, TypeCheckError};
use regex::Regex;
use std::sync::OnceLock;

/// Diagnostics from one type-check run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCheckReport {
    pub errors: Vec<TypeCheckError>,
}

impl TypeCheckReport {
    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Verifier collaborator: reports hard errors and warnings for a candidate.
#[async_trait]
pub trait TypeChecker: Send + Sync {
    async fn check(&self, code: &str) -> Result<TypeCheckReport, ToolError>;
}

/// Runs a `tsc`-compatible command on the candidate written to a scratch file.
pub struct TscChecker {
    command: String,
}

impl TscChecker {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(config.type_checker.clone())
    }
}

#[async_trait]
impl TypeChecker for TscChecker {
    async fn check(&self, code: &str) -> Result<TypeCheckReport, ToolError> {
        let scratch = Scratch::with_file("candidate.ts", code).await?;
        let output = run_tool(&self.command, &scratch.file(), scratch.dir()).await?;

        let errors = parse_tsc_output(&output.combined());
        if errors.is_empty() && !output.succeeded() {
            // Non-zero exit with nothing we recognize: the checker itself broke.
            return Err(ToolError::Failed {
                command: self.command.clone(),
                exit_code: output.exit_code,
                message: first_error_line(&output.combined()),
            });
        }
        tracing::debug!(diagnostics = errors.len(), "type check complete");
        Ok(TypeCheckReport { errors })
    }
}

/// Parse `tsc --pretty false` diagnostics.
///
/// Recognizes `file(line,col): error TS2322: message` and the location-less
/// `error TS5023: message`. Indented lines that follow a diagnostic are
/// folded into its message.
pub fn parse_tsc_output(output: &str) -> Vec<TypeCheckError> {
    static LOCATED_RE: OnceLock<Regex> = OnceLock::new();
    static GLOBAL_RE: OnceLock<Regex> = OnceLock::new();
    let located = LOCATED_RE.get_or_init(|| {
        Regex::new(r"^(.+?)\((\d+),(\d+)\):\s+(error|warning)\s+TS(\d+):\s*(.*)$").unwrap()
    });
    let global =
        GLOBAL_RE.get_or_init(|| Regex::new(r"^(error|warning)\s+TS(\d+):\s*(.*)$").unwrap());

    let mut diagnostics: Vec<TypeCheckError> = Vec::new();
    let mut in_diagnostic = false;

    for line in output.lines() {
        if let Some(caps) = located.captures(line) {
            diagnostics.push(TypeCheckError {
                line: caps[2].parse().unwrap_or(0),
                column: caps[3].parse().unwrap_or(0),
                code: caps[5].parse().unwrap_or(0),
                message: caps[6].trim().to_string(),
                severity: severity(&caps[4]),
            });
            in_diagnostic = true;
        } else if let Some(caps) = global.captures(line.trim_start()) {
            diagnostics.push(TypeCheckError {
                line: 0,
                column: 0,
                code: caps[2].parse().unwrap_or(0),
                message: caps[3].trim().to_string(),
                severity: severity(&caps[1]),
            });
            in_diagnostic = true;
        } else if in_diagnostic
            && line.starts_with([' ', '\t'])
            && !line.trim().is_empty()
            && let Some(last) = diagnostics.last_mut()
        {
            last.message.push('\n');
            last.message.push_str(line.trim());
        } else {
            in_diagnostic = false;
        }
    }
    diagnostics
}

fn severity(word: &str) -> Severity {
    if word == "warning" {
        Severity::Warning
    } else {
        Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_located_diagnostic() {
        let out = "candidate.ts(3,12): error TS2322: Type 'string' is not assignable to type 'number'.\n";
        let errors = parse_tsc_output(out);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].column, 12);
        assert_eq!(errors[0].code, 2322);
        assert!(errors[0].is_error());
        assert!(errors[0].message.starts_with("Type 'string'"));
    }

    #[test]
    fn test_continuation_lines_fold_into_message() {
        let out = "\
candidate.ts(5,3): error TS2345: Argument of type '{ a: string; }' is not assignable to parameter of type 'Opts'.
  Types of property 'a' are incompatible.
    Type 'string' is not assignable to type 'number'.
candidate.ts(9,1): warning TS6133: 'x' is declared but its value is never read.
";
        let errors = parse_tsc_output(out);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message.lines().count(), 3);
        assert!(errors[0].message.ends_with("to type 'number'."));
        assert_eq!(errors[1].severity, Severity::Warning);
        assert_eq!(errors[1].code, 6133);
    }

    #[test]
    fn test_global_diagnostic() {
        let errors = parse_tsc_output("error TS5023: Unknown compiler option '--bogus'.");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 0);
        assert_eq!(errors[0].code, 5023);
    }

    #[test]
    fn test_unrelated_output_is_ignored() {
        assert!(parse_tsc_output("Version 5.4.5\n\nFound 0 errors.\n").is_empty());
    }

    #[test]
    fn test_report_counts_errors_only() {
        let report = TypeCheckReport {
            errors: vec![
                TypeCheckError::warning(1, 1, 6133, "unused"),
                TypeCheckError::error(2, 1, 2304, "Cannot find name 'foo'."),
            ],
        };
        assert_eq!(report.error_count(), 1);
        assert!(report.has_errors());
    }
}
