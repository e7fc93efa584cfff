//! Structural signature, test case, and result types.
//!
//! Everything here is plain data: produced by one stage of the pipeline and
//! consumed read-only by the next. JSON field names follow the camelCase
//! response contract.

use crate::value::TestValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used when a callable's name cannot be located in its source.
pub const ANONYMOUS_NAME: &str = "anonymous";

/// A single declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    /// Declared type, kept as an opaque token (`any` when unannotated).
    #[serde(rename = "type")]
    pub type_annotation: String,
    #[serde(default)]
    pub optional: bool,
    /// Variadic tail parameter (`...rest`).
    #[serde(default)]
    pub rest: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: type_annotation.into(),
            optional: false,
            rest: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }

    /// True if a caller must supply this parameter.
    pub fn is_required(&self) -> bool {
        !self.optional && !self.rest
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest {
            write!(f, "...")?;
        }
        write!(f, "{}", self.name)?;
        if self.optional && !self.rest {
            write!(f, "?")?;
        }
        write!(f, ": {}", self.type_annotation)
    }
}

/// Structural shape of a callable inferred from its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub return_type: String,
    /// Error type names declared via `@throws` doc tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type: return_type.into(),
            throws: Vec::new(),
            is_async: false,
        }
    }

    /// Signature reported for sources that contain no recognizable callable.
    pub fn placeholder() -> Self {
        Self::new(ANONYMOUS_NAME, Vec::new(), "any")
    }

    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Number of parameters a caller must always supply.
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required()).count()
    }

    pub fn total_count(&self) -> usize {
        self.parameters.len()
    }

    /// Whether an argument list of `len` values fits this signature's arity.
    pub fn accepts_arity(&self, len: usize) -> bool {
        len >= self.required_count() && len <= self.total_count()
    }

    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS_NAME
    }
}

impl fmt::Display for Signature {
    /// Compact one-line rendering: `async name(a: number, b?: string): R`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_async {
            write!(f, "async ")?;
        }
        let params: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        write!(f, "{}({}): {}", self.name, params.join(", "), self.return_type)?;
        if !self.throws.is_empty() {
            write!(f, " throws {}", self.throws.join(" | "))?;
        }
        Ok(())
    }
}

/// Which producer created a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Generic,
    Oracle,
    Fallback,
    User,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Oracle => "oracle",
            Self::Fallback => "fallback",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executable test case against a synthesized callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Unique within a generated corpus.
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<TestValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<TestValue>,
    #[serde(default)]
    pub should_throw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub provenance: Provenance,
}

impl TestCase {
    /// Create a case whose reasoning defaults to its provenance tag.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        inputs: Vec<TestValue>,
        provenance: Provenance,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs,
            expected_output: None,
            should_throw: false,
            expected_error: None,
            reasoning: Some(provenance.as_str().to_string()),
            provenance,
        }
    }

    /// Expect the invocation to throw, optionally with a specific error type.
    #[must_use]
    pub fn throwing(mut self, error: Option<&str>) -> Self {
        self.should_throw = true;
        self.expected_error = error.map(String::from);
        self
    }

    #[must_use]
    pub fn expecting(mut self, value: TestValue) -> Self {
        self.expected_output = Some(value);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Severity of a type checker diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic reported by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCheckError {
    pub line: usize,
    pub column: usize,
    pub code: u32,
    pub message: String,
    pub severity: Severity,
}

impl TypeCheckError {
    pub fn error(line: usize, column: usize, code: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(line: usize, column: usize, code: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(line, column, code, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for TypeCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, col {}: TS{} {}",
            self.line, self.column, self.code, self.message
        )
    }
}

/// Type-check outcome reported for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCheckOutcome {
    pub signature: Option<Signature>,
    #[serde(default)]
    pub errors: Vec<TypeCheckError>,
    pub is_valid: bool,
}

impl TypeCheckOutcome {
    /// Valid means no error-severity diagnostics; warnings are allowed.
    pub fn new(signature: Option<Signature>, errors: Vec<TypeCheckError>) -> Self {
        let is_valid = !errors.iter().any(TypeCheckError::is_error);
        Self {
            signature,
            errors,
            is_valid,
        }
    }
}

/// One generate+verify pass of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationStep {
    /// 0-based; iteration 0 is the initial attempt.
    pub iteration: usize,
    pub code: String,
    #[serde(default)]
    pub errors: Vec<TypeCheckError>,
    /// Error-severity diagnostics only.
    pub error_count: usize,
}

impl IterationStep {
    pub fn new(iteration: usize, code: impl Into<String>, errors: Vec<TypeCheckError>) -> Self {
        let error_count = errors.iter().filter(|e| e.is_error()).count();
        Self {
            iteration,
            code: code.into(),
            errors,
            error_count,
        }
    }
}

/// Final outcome of the generate-verify-retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub code: String,
    #[serde(rename = "typeCheckResult")]
    pub type_check: TypeCheckOutcome,
    /// Index of the last iteration executed.
    pub iterations: usize,
    #[serde(rename = "iterationHistory")]
    pub history: Vec<IterationStep>,
}

/// Status of one executed test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    Skipped,
    Warning,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Skipped => "skipped",
            Self::Warning => "warning",
        };
        f.write_str(s)
    }
}

/// Result of a single test case after execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub name: String,
    pub description: String,
    pub passed: bool,
    pub status: TestStatus,
    pub message: String,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
}

impl TestCaseResult {
    pub fn new(case: &TestCase, status: TestStatus, message: impl Into<String>) -> Self {
        Self {
            name: case.name.clone(),
            description: case.description.clone(),
            passed: status == TestStatus::Passed,
            status,
            message: message.into(),
            execution_time_ms: 0,
        }
    }

    #[must_use]
    pub fn with_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }
}

/// Aggregated result of executing a test corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    pub tests: Vec<TestCaseResult>,
    pub label: String,
    #[serde(rename = "totalExecutionTime")]
    pub total_execution_time_ms: u64,
    pub has_warnings: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linter_warnings: Option<Vec<String>>,
}

impl TestResult {
    pub fn passed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.passed).count()
    }

    /// Fraction of passing cases; 0.0 for an empty corpus.
    pub fn pass_rate(&self) -> f64 {
        if self.tests.is_empty() {
            0.0
        } else {
            self.passed_count() as f64 / self.tests.len() as f64
        }
    }
}
