//! The generate → verify → retry loop.
//!
//! Each pass asks the oracle for code, type-checks it, and records an
//! [`IterationStep`] before deciding whether to stop. The loop ends on the
//! first candidate without error-severity diagnostics, or when the retry
//! budget is spent.

use fnsynth_core::{
    GenerationResult, IterationStep, Severity, Signature, TypeCheckError, TypeCheckOutcome,
};
use fnsynth_oracle::prompt::fill_template;
use fnsynth_oracle::reply::extract_code;
use fnsynth_oracle::{CodeOracle, OracleError};
use fnsynth_parser::extract_signature;
use fnsynth_tools::{ToolError, TypeChecker};
use std::sync::Arc;

/// Upper bound on the retry budget a caller may request.
pub const MAX_RETRY_BUDGET: i64 = 10;

/// System prompt for code generation.
pub const GENERATE_SYSTEM: &str = include_str!("prompts/generate_system.md");

/// Prompt template for the first attempt.
pub const GENERATE_PROMPT: &str = include_str!("prompts/generate.md");

/// Prompt template for a retry after type errors.
pub const RETRY_PROMPT: &str = include_str!("prompts/retry.md");

/// Message of the synthetic diagnostic recorded when a reply has no code.
pub const NO_CODE_MESSAGE: &str = "oracle reply contained no code";

/// Errors that stop generation outright.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("oracle failed on the initial attempt: {0}")]
    Oracle(#[from] OracleError),
    #[error("type checker failed: {0}")]
    Verifier(#[from] ToolError),
}

/// Drives the oracle and the type checker until the code is clean or the
/// retry budget runs out.
pub struct RetryOrchestrator {
    oracle: Arc<dyn CodeOracle>,
    checker: Arc<dyn TypeChecker>,
    max_retries: i64,
}

/// The most recent verified candidate.
struct Candidate {
    code: String,
    outcome: TypeCheckOutcome,
}

impl RetryOrchestrator {
    pub fn new(oracle: Arc<dyn CodeOracle>, checker: Arc<dyn TypeChecker>, max_retries: i64) -> Self {
        Self {
            oracle,
            checker,
            max_retries,
        }
    }

    pub async fn run(&self, goal: &str) -> Result<GenerationResult, GenerationError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(GenerationError::InvalidInput(
                "goal must not be empty".to_string(),
            ));
        }
        let budget = validate_budget(self.max_retries)?;

        let mut history: Vec<IterationStep> = Vec::new();
        let mut last: Option<Candidate> = None;
        let mut prompt = initial_prompt(goal);
        let mut iteration = 0usize;

        loop {
            tracing::debug!(iteration, oracle = %self.oracle.describe(), "requesting candidate");
            let reply = match self.oracle.generate(GENERATE_SYSTEM, &prompt).await {
                Ok(reply) => reply,
                Err(e) => match last {
                    None => return Err(GenerationError::Oracle(e)),
                    Some(candidate) => {
                        tracing::warn!(iteration, error = %e, "oracle failed during retry; stopping");
                        return Ok(finish(false, candidate, history));
                    }
                },
            };

            let code = extract_code(&reply);
            let (errors, signature) = if code.trim().is_empty() {
                (vec![TypeCheckError::error(0, 0, 0, NO_CODE_MESSAGE)], None)
            } else {
                let report = self.checker.check(&code).await?;
                (report.errors, extract_signature(&code).ok())
            };

            let step = IterationStep::new(iteration, code.clone(), errors.clone());
            tracing::debug!(
                iteration,
                errors = step.error_count,
                warnings = step.errors.len() - step.error_count,
                "candidate verified"
            );
            history.push(step);

            let outcome = TypeCheckOutcome::new(signature, errors);
            let candidate = Candidate { code, outcome };

            if candidate.outcome.is_valid {
                tracing::info!(iteration, "candidate passed type checking");
                return Ok(finish(true, candidate, history));
            }
            if iteration >= budget {
                tracing::info!(iteration, "retry budget exhausted");
                return Ok(finish(false, candidate, history));
            }

            prompt = retry_prompt(
                goal,
                &candidate.code,
                candidate.outcome.signature.as_ref(),
                &candidate.outcome.errors,
            );
            last = Some(candidate);
            iteration += 1;
        }
    }
}

fn validate_budget(max_retries: i64) -> Result<usize, GenerationError> {
    if max_retries < 0 {
        return Err(GenerationError::InvalidInput(format!(
            "retry budget must not be negative (got {max_retries})"
        )));
    }
    if max_retries > MAX_RETRY_BUDGET {
        return Err(GenerationError::InvalidInput(format!(
            "retry budget {max_retries} exceeds the maximum of {MAX_RETRY_BUDGET}"
        )));
    }
    Ok(max_retries as usize)
}

/// `iterations` is the index of the last recorded step.
fn finish(success: bool, candidate: Candidate, history: Vec<IterationStep>) -> GenerationResult {
    GenerationResult {
        success,
        code: candidate.code,
        type_check: candidate.outcome,
        iterations: history.len().saturating_sub(1),
        history,
    }
}

pub fn initial_prompt(goal: &str) -> String {
    fill_template(GENERATE_PROMPT, &[("goal", goal)])
}

/// Retry prompt: goal, previous code verbatim, compact signature, and the
/// outstanding diagnostics grouped by severity.
pub fn retry_prompt(
    goal: &str,
    code: &str,
    signature: Option<&Signature>,
    errors: &[TypeCheckError],
) -> String {
    let signature = signature.map_or_else(|| "(not detected)".to_string(), ToString::to_string);
    let listing = |severity: Severity| {
        let lines: Vec<String> = errors
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| format!("- {e}"))
            .collect();
        let count = lines.len();
        let text = if lines.is_empty() {
            "(none)".to_string()
        } else {
            lines.join("\n")
        };
        (count, text)
    };
    let (error_count, error_text) = listing(Severity::Error);
    let (warning_count, warning_text) = listing(Severity::Warning);

    fill_template(
        RETRY_PROMPT,
        &[
            ("goal", goal),
            ("code", code.trim()),
            ("signature", signature.as_str()),
            ("error_count", error_count.to_string().as_str()),
            ("errors", error_text.as_str()),
            ("warning_count", warning_count.to_string().as_str()),
            ("warnings", warning_text.as_str()),
        ],
    )
}
