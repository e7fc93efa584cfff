//! End-to-end synthesis: generate verified code, build the test corpus, run
//! it, and report.
//!
//! Phases: retry loop → generic + user + domain tests → assemble → execute →
//! optional lint → aggregate. Test synthesis starts only once the loop has
//! produced type-correct code.

use crate::orchestrator::{GenerationError, RetryOrchestrator};
use chrono::{DateTime, Utc};
use fnsynth_core::{
    GenerationResult, IterationStep, Signature, SynthConfig, TestCase, TestResult,
    TypeCheckOutcome,
};
use fnsynth_oracle::CodeOracle;
use fnsynth_testgen::{
    DomainTestEnhancer, aggregate, assemble, parse_user_hints, synthesize_generic,
};
use fnsynth_tools::{ExecutionOutput, Linter, TestExecutor, TypeChecker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request accepted by [`Pipeline::run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub goal: String,
    /// Free-text test hints, e.g. `input 2, 3 should return 5`.
    #[serde(default)]
    pub test_cases: Vec<String>,
}

impl SynthesisRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            test_cases: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.test_cases = hints;
        self
    }
}

/// Response produced by [`Pipeline::run`]. Always returned, never an error:
/// failures are reported through `success` and `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    pub success: bool,
    pub code: String,
    pub type_check_result: TypeCheckOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<TestResult>,
    pub iterations: usize,
    pub iteration_history: Vec<IterationStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl SynthesisResponse {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: String::new(),
            type_check_result: TypeCheckOutcome::default(),
            test_result: None,
            iterations: 0,
            iteration_history: Vec::new(),
            error: Some(error.into()),
            generated_at: Utc::now(),
        }
    }

    fn from_generation(generation: GenerationResult, test_result: Option<TestResult>) -> Self {
        let tests_passed = test_result.as_ref().is_some_and(|t| t.success);
        Self {
            success: generation.success && tests_passed,
            code: generation.code,
            type_check_result: generation.type_check,
            test_result,
            iterations: generation.iterations,
            iteration_history: generation.history,
            error: None,
            generated_at: Utc::now(),
        }
    }
}

/// Errors from assembling a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// The assembled synthesis pipeline.
pub struct Pipeline {
    oracle: Arc<dyn CodeOracle>,
    checker: Arc<dyn TypeChecker>,
    executor: Arc<dyn TestExecutor>,
    linter: Option<Arc<dyn Linter>>,
    config: SynthConfig,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Run the whole pipeline for one request.
    pub async fn run(&self, request: SynthesisRequest) -> SynthesisResponse {
        tracing::info!(goal = %request.goal.trim(), hints = request.test_cases.len(), "synthesis started");

        let generation = match self.generate(&request.goal).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                return SynthesisResponse::failed(e.to_string());
            }
        };

        if !generation.success {
            tracing::warn!(
                iterations = generation.iterations,
                "no type-correct candidate; skipping tests"
            );
            return SynthesisResponse::from_generation(generation, None);
        }

        let signature = generation
            .type_check
            .signature
            .clone()
            .unwrap_or_else(Signature::placeholder);
        let test_result = self
            .test(&request.goal, &generation.code, &signature, &request.test_cases)
            .await;
        tracing::info!(
            passed = test_result.passed_count(),
            total = test_result.tests.len(),
            success = test_result.success,
            "synthesis finished"
        );
        SynthesisResponse::from_generation(generation, Some(test_result))
    }

    /// Only the generate-verify-retry loop.
    pub async fn generate(&self, goal: &str) -> Result<GenerationResult, GenerationError> {
        RetryOrchestrator::new(
            Arc::clone(&self.oracle),
            Arc::clone(&self.checker),
            self.config.generation.max_retries,
        )
        .run(goal)
        .await
    }

    /// Build the full test corpus for `code`: generic, then user, then domain.
    pub async fn corpus(
        &self,
        goal: &str,
        code: &str,
        signature: &Signature,
        hints: &[String],
    ) -> Vec<TestCase> {
        let mut cases = synthesize_generic(signature);
        cases.extend(parse_user_hints(hints, signature));
        let enhancer =
            DomainTestEnhancer::new(Arc::clone(&self.oracle), self.config.enhancer.clone());
        let domain = enhancer.enhance(goal, code, signature, &cases).await;
        cases.extend(domain);
        tracing::debug!(cases = cases.len(), "test corpus built");
        cases
    }

    /// Build, run, and aggregate the test corpus for verified `code`.
    pub async fn test(
        &self,
        goal: &str,
        code: &str,
        signature: &Signature,
        hints: &[String],
    ) -> TestResult {
        let cases = self.corpus(goal, code, signature, hints).await;
        let unit = assemble(code, signature, &cases);

        let output = match self.executor.run(&unit).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "test executor failed");
                ExecutionOutput {
                    stderr: e.to_string(),
                    ..ExecutionOutput::default()
                }
            }
        };

        let linter_warnings = self.lint(code).await;
        aggregate(
            &cases,
            &output,
            self.config.testing.pass_threshold,
            &self.config.testing.label,
            linter_warnings,
        )
    }

    async fn lint(&self, code: &str) -> Option<Vec<String>> {
        let linter = self.linter.as_ref()?;
        match linter.lint(code).await {
            Ok(warnings) => Some(warnings),
            Err(e) => {
                tracing::warn!(error = %e, "linter failed; continuing without warnings");
                None
            }
        }
    }
}

/// Builder for [`Pipeline`]. The oracle, type checker, and executor are
/// required; the linter is optional.
#[derive(Default)]
pub struct PipelineBuilder {
    oracle: Option<Arc<dyn CodeOracle>>,
    checker: Option<Arc<dyn TypeChecker>>,
    executor: Option<Arc<dyn TestExecutor>>,
    linter: Option<Arc<dyn Linter>>,
    config: SynthConfig,
}

impl PipelineBuilder {
    #[must_use]
    pub fn oracle(mut self, oracle: Arc<dyn CodeOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    #[must_use]
    pub fn type_checker(mut self, checker: Arc<dyn TypeChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn TestExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn linter(mut self, linter: Option<Arc<dyn Linter>>) -> Self {
        self.linter = linter;
        self
    }

    #[must_use]
    pub fn config(mut self, config: SynthConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let oracle = self
            .oracle
            .ok_or_else(|| PipelineError::Config("an oracle is required".to_string()))?;
        let checker = self
            .checker
            .ok_or_else(|| PipelineError::Config("a type checker is required".to_string()))?;
        let executor = self
            .executor
            .ok_or_else(|| PipelineError::Config("a test executor is required".to_string()))?;
        Ok(Pipeline {
            oracle,
            checker,
            executor,
            linter: self.linter,
            config: self.config,
        })
    }
}
