use async_trait::async_trait;
use fnsynth_core::config::SynthConfig;
use fnsynth_core::{Provenance, TestStatus};
use fnsynth_engine::{Pipeline, SynthesisRequest};
use fnsynth_oracle::reply::extract_code;
use fnsynth_oracle::{CodeOracle, OracleError};
use fnsynth_parser::extract_signature;
use fnsynth_tools::{
    ExecutionOutput, Linter, TestExecutor, TestUnit, ToolError, TypeCheckReport, TypeChecker,
};
use std::sync::Arc;

const CLEAN: &str = "```typescript\n/** @throws {RangeError} */\nexport function add(a: number, b: number): number {\n  return a + b;\n}\n```";

const DOMAIN_REPLY: &str = r#"[
  {"name": "negatives", "description": "Adds two negatives", "inputs": [-1, -2],
   "expectedOutput": -3, "reasoning": "sign handling"}
]"#;

/// Answers generation prompts with clean code and domain prompts with JSON.
struct TwoFacedOracle;

#[async_trait]
impl CodeOracle for TwoFacedOracle {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, OracleError> {
        if prompt.contains("Already covered") {
            Ok(DOMAIN_REPLY.to_string())
        } else {
            Ok(CLEAN.to_string())
        }
    }
}

struct DownOracle;

#[async_trait]
impl CodeOracle for DownOracle {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, OracleError> {
        Err(OracleError::Unavailable("connection refused".to_string()))
    }
}

struct CleanChecker;

#[async_trait]
impl TypeChecker for CleanChecker {
    async fn check(&self, _code: &str) -> Result<TypeCheckReport, ToolError> {
        Ok(TypeCheckReport::default())
    }
}

/// Reports every case as passing except the ones whose name contains `fail_on`.
struct FakeExecutor {
    fail_on: &'static str,
}

#[async_trait]
impl TestExecutor for FakeExecutor {
    async fn run(&self, unit: &TestUnit) -> Result<ExecutionOutput, ToolError> {
        let mut stdout = String::new();
        for name in &unit.case_names {
            if name.contains(self.fail_on) {
                stdout.push_str(&format!("FAIL: {name} (1ms) - expected a throw\n"));
            } else {
                stdout.push_str(&format!("PASS: {name} (0ms)\n"));
            }
        }
        Ok(ExecutionOutput {
            command: "fake".to_string(),
            stdout,
            stderr: String::new(),
            exit_code: Some(1),
            duration_ms: 10,
        })
    }
}

struct MissingExecutor;

#[async_trait]
impl TestExecutor for MissingExecutor {
    async fn run(&self, _unit: &TestUnit) -> Result<ExecutionOutput, ToolError> {
        Err(ToolError::Launch {
            command: "tsx".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}

struct FakeLinter(Result<Vec<String>, ()>);

#[async_trait]
impl Linter for FakeLinter {
    async fn lint(&self, _code: &str) -> Result<Vec<String>, ToolError> {
        self.0.clone().map_err(|()| ToolError::EmptyCommand)
    }
}

fn pipeline(oracle: Arc<dyn CodeOracle>, executor: Arc<dyn TestExecutor>) -> Pipeline {
    Pipeline::builder()
        .oracle(oracle)
        .type_checker(Arc::new(CleanChecker))
        .executor(executor)
        .config(SynthConfig::default())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_full_run() {
    let pipeline = pipeline(Arc::new(TwoFacedOracle), Arc::new(FakeExecutor { fail_on: "_nan" }));
    let request = SynthesisRequest::new("Add two numbers")
        .with_hints(vec!["input 2, 3 should return 5".to_string()]);
    let response = pipeline.run(request).await;

    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.iterations, 0);
    assert!(response.code.starts_with("/** @throws"));
    let sig = response.type_check_result.signature.as_ref().unwrap();
    assert_eq!(sig.throws, vec!["RangeError".to_string()]);

    let tests = response.test_result.as_ref().unwrap();
    assert!(tests.tests.len() >= 14);
    assert!(tests.tests.iter().any(|t| t.name == "user_1"));
    assert!(tests.tests.iter().any(|t| t.name == "domain_negatives"));
    let failed: Vec<&str> = tests
        .tests
        .iter()
        .filter(|t| t.status == TestStatus::Failed)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(failed, vec!["boundary_a_nan", "boundary_b_nan"]);
    assert_eq!(tests.label, "Generated Tests");
    assert!(tests.linter_warnings.is_none());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["typeCheckResult"]["isValid"], true);
    assert_eq!(json["testResult"]["success"], true);
    assert_eq!(json["iterationHistory"].as_array().map(Vec::len), Some(1));
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_corpus_order() {
    let pipeline = pipeline(Arc::new(TwoFacedOracle), Arc::new(FakeExecutor { fail_on: "-" }));
    let code = extract_code(CLEAN);
    let signature = extract_signature(&code).unwrap();
    let cases = pipeline
        .corpus("Add", &code, &signature, &["input 1, 1 -> 2".to_string()])
        .await;

    let first_user = cases.iter().position(|c| c.provenance == Provenance::User).unwrap();
    let first_domain = cases.iter().position(|c| c.provenance == Provenance::Oracle).unwrap();
    assert!(cases[..first_user].iter().all(|c| c.provenance == Provenance::Generic));
    assert!(first_user < first_domain);
}

#[tokio::test]
async fn test_empty_goal_reports_error() {
    let pipeline = pipeline(Arc::new(TwoFacedOracle), Arc::new(FakeExecutor { fail_on: "-" }));
    let response = pipeline.run(SynthesisRequest::new("  ")).await;

    assert!(!response.success);
    assert!(response.error.as_deref().unwrap().starts_with("invalid input"));
    assert!(response.test_result.is_none());
    assert!(response.iteration_history.is_empty());
}

#[tokio::test]
async fn test_oracle_down_reports_error() {
    let pipeline = pipeline(Arc::new(DownOracle), Arc::new(FakeExecutor { fail_on: "-" }));
    let response = pipeline.run(SynthesisRequest::new("Add two numbers")).await;

    assert!(!response.success);
    assert!(response.error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_executor_failure_marks_cases_error() {
    let pipeline = pipeline(Arc::new(TwoFacedOracle), Arc::new(MissingExecutor));
    let response = pipeline.run(SynthesisRequest::new("Add two numbers")).await;

    assert!(!response.success);
    assert!(response.error.is_none());
    let tests = response.test_result.unwrap();
    assert!(tests.tests.iter().all(|t| t.status == TestStatus::Error));
    assert!(tests.tests[0].message.starts_with("test unit did not complete"));
}

#[tokio::test]
async fn test_linter_warnings_and_failures() {
    let build = |linter: FakeLinter| {
        Pipeline::builder()
            .oracle(Arc::new(TwoFacedOracle))
            .type_checker(Arc::new(CleanChecker))
            .executor(Arc::new(FakeExecutor { fail_on: "-" }))
            .linter(Some(Arc::new(linter) as Arc<dyn Linter>))
            .build()
            .unwrap()
    };

    let warned = build(FakeLinter(Ok(vec!["2:3 Unexpected var".to_string()])))
        .run(SynthesisRequest::new("Add two numbers"))
        .await;
    let tests = warned.test_result.unwrap();
    assert!(tests.has_warnings);
    assert_eq!(tests.linter_warnings, Some(vec!["2:3 Unexpected var".to_string()]));

    let broken = build(FakeLinter(Err(())))
        .run(SynthesisRequest::new("Add two numbers"))
        .await;
    assert!(broken.success);
    assert!(broken.test_result.unwrap().linter_warnings.is_none());
}

#[test]
fn test_builder_rejects_missing_parts() {
    assert!(Pipeline::builder().build().is_err());
    assert!(
        Pipeline::builder()
            .oracle(Arc::new(DownOracle))
            .build()
            .is_err()
    );
}
