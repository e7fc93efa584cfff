use async_trait::async_trait;
use fnsynth_core::TypeCheckError;
use fnsynth_engine::orchestrator::NO_CODE_MESSAGE;
use fnsynth_engine::{GenerationError, RetryOrchestrator};
use fnsynth_oracle::{CodeOracle, OracleError};
use fnsynth_tools::{ToolError, TypeCheckReport, TypeChecker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const CLEAN: &str = "```ts\nexport function add(a: number, b: number): number {\n  return a + b;\n}\n```";
const BROKEN: &str = "```ts\nexport function add(a: number, b: number): string {\n  return a + b;\n}\n```";

/// Replies from a script; the last entry repeats once the script runs out.
struct ScriptedOracle {
    replies: Vec<Result<&'static str, &'static str>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn new(replies: Vec<Result<&'static str, &'static str>>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeOracle for ScriptedOracle {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies[n.min(self.replies.len() - 1)];
        reply
            .map(str::to_string)
            .map_err(|e| OracleError::Unavailable(e.to_string()))
    }
}

/// Flags any code whose return annotation is `string` as a type error.
struct FakeChecker;

#[async_trait]
impl TypeChecker for FakeChecker {
    async fn check(&self, code: &str) -> Result<TypeCheckReport, ToolError> {
        let mut errors = vec![TypeCheckError::warning(1, 1, 6133, "unused value")];
        if code.contains("): string") {
            errors.push(TypeCheckError::error(
                2,
                3,
                2322,
                "Type 'number' is not assignable to type 'string'.",
            ));
        }
        Ok(TypeCheckReport { errors })
    }
}

struct BrokenChecker;

#[async_trait]
impl TypeChecker for BrokenChecker {
    async fn check(&self, _code: &str) -> Result<TypeCheckReport, ToolError> {
        Err(ToolError::EmptyCommand)
    }
}

fn orchestrator(oracle: Arc<ScriptedOracle>, max_retries: i64) -> RetryOrchestrator {
    RetryOrchestrator::new(oracle, Arc::new(FakeChecker), max_retries)
}

#[tokio::test]
async fn test_immediate_success() {
    let oracle = ScriptedOracle::new(vec![Ok(CLEAN)]);
    let result = orchestrator(oracle.clone(), 3).run("Add two numbers").await.unwrap();

    assert!(result.success);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.history.len(), 1);
    assert_eq!(oracle.calls(), 1);
    // Warnings do not block success.
    assert!(result.type_check.is_valid);
    assert_eq!(result.type_check.errors.len(), 1);
    let sig = result.type_check.signature.unwrap();
    assert_eq!(sig.name, "add");
    assert_eq!(sig.return_type, "number");
}

#[tokio::test]
async fn test_terminates_on_first_clean_retry() {
    let oracle = ScriptedOracle::new(vec![Ok(BROKEN), Ok(CLEAN)]);
    let result = orchestrator(oracle.clone(), 3).run("Add two numbers").await.unwrap();

    assert!(result.success);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.history.len(), 2);
    assert_eq!(result.history[0].error_count, 1);
    assert_eq!(result.history[1].error_count, 0);
    assert_eq!(oracle.calls(), 2);

    let prompts = oracle.prompts.lock().unwrap();
    assert!(prompts[1].contains("): string {"));
    assert!(prompts[1].contains("TS2322"));
    assert!(prompts[1].contains("add(a: number, b: number): string"));
}

#[tokio::test]
async fn test_retry_bound() {
    for budget in [0, 1, 3, 10] {
        let oracle = ScriptedOracle::new(vec![Ok(BROKEN)]);
        let result = orchestrator(oracle.clone(), budget).run("Add").await.unwrap();

        let budget = budget as usize;
        assert!(!result.success);
        assert_eq!(result.iterations, budget);
        assert_eq!(result.history.len(), budget + 1);
        assert_eq!(oracle.calls(), budget + 1);
        for (i, step) in result.history.iter().enumerate() {
            assert_eq!(step.iteration, i);
        }
        assert!(!result.type_check.is_valid);
    }
}

#[tokio::test]
async fn test_invalid_input_never_calls_oracle() {
    let oracle = ScriptedOracle::new(vec![Ok(CLEAN)]);
    for (goal, budget) in [("", 3), ("   \n", 3), ("Add", -1), ("Add", 11)] {
        let err = orchestrator(oracle.clone(), budget).run(goal).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(_)), "{goal:?}/{budget}");
    }
    assert_eq!(oracle.calls(), 0);
}

#[tokio::test]
async fn test_initial_oracle_failure_is_fatal() {
    let oracle = ScriptedOracle::new(vec![Err("connection refused")]);
    let err = orchestrator(oracle, 3).run("Add").await.unwrap_err();
    assert!(matches!(err, GenerationError::Oracle(OracleError::Unavailable(_))));
}

#[tokio::test]
async fn test_later_oracle_failure_keeps_last_candidate() {
    let oracle = ScriptedOracle::new(vec![Ok(BROKEN), Err("connection reset")]);
    let result = orchestrator(oracle, 3).run("Add").await.unwrap();

    assert!(!result.success);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.history.len(), 1);
    assert!(result.code.contains("): string"));
}

#[tokio::test]
async fn test_empty_reply_counts_as_an_error() {
    let oracle = ScriptedOracle::new(vec![Ok("   "), Ok(CLEAN)]);
    let result = orchestrator(oracle, 2).run("Add").await.unwrap();

    assert!(result.success);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.history[0].error_count, 1);
    assert_eq!(result.history[0].errors[0].message, NO_CODE_MESSAGE);
}

#[tokio::test]
async fn test_checker_failure_is_fatal() {
    let oracle = ScriptedOracle::new(vec![Ok(CLEAN)]);
    let err = RetryOrchestrator::new(oracle, Arc::new(BrokenChecker), 3)
        .run("Add")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Verifier(ToolError::EmptyCommand)));
}
