//! Goal-specific test cases from the oracle, with a signature-only fallback.

use crate::generic::{NameSet, ident};
use crate::repair::{Candidates, parse_candidates};
use crate::values::{self, ValueKind};
use fnsynth_core::config::EnhancerConfig;
use fnsynth_core::{Provenance, Signature, TestCase, TestValue};
use fnsynth_oracle::CodeOracle;
use fnsynth_oracle::prompt::fill_template;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Prompt template for domain test generation.
pub const DOMAIN_TESTS_PROMPT: &str = include_str!("prompts/domain_tests.md");

/// System prompt for domain test generation.
pub const DOMAIN_TESTS_SYSTEM: &str = include_str!("prompts/domain_tests_system.md");

/// Reasoning attached to every fallback case.
pub const FALLBACK_REASONING: &str = "fallback";

/// Reasoning attached to cases recovered by the manual scan.
const SCANNED_REASONING: &str = "recovered from unstructured oracle output";

/// Asks the oracle for domain-specific cases. Never fails: any problem
/// (timeout, oracle error, unusable reply) yields the fallback list.
pub struct DomainTestEnhancer {
    oracle: Option<Arc<dyn CodeOracle>>,
    config: EnhancerConfig,
}

impl DomainTestEnhancer {
    pub fn new(oracle: Arc<dyn CodeOracle>, config: EnhancerConfig) -> Self {
        Self {
            oracle: Some(oracle),
            config,
        }
    }

    /// An enhancer that always returns the fallback list.
    pub fn offline(config: EnhancerConfig) -> Self {
        Self {
            oracle: None,
            config,
        }
    }

    pub async fn enhance(
        &self,
        goal: &str,
        code: &str,
        signature: &Signature,
        generic: &[TestCase],
    ) -> Vec<TestCase> {
        let oracle = match &self.oracle {
            Some(oracle) if !self.config.skip_oracle => oracle,
            _ => {
                tracing::info!("oracle skipped; using fallback domain tests");
                return fallback_cases(signature);
            }
        };

        let prompt = self.build_prompt(goal, code, signature, generic);
        let timeout = self.config.timeout();
        // Dropping the future on timeout abandons the in-flight request.
        let request = oracle.generate(DOMAIN_TESTS_SYSTEM, &prompt);
        let reply = match tokio::time::timeout(timeout, request).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "domain test oracle failed; using fallback");
                return fallback_cases(signature);
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "domain test oracle timed out; using fallback"
                );
                return fallback_cases(signature);
            }
        };

        let accepted = self.accept(&reply, signature, generic);
        if accepted.is_empty() {
            tracing::warn!("no usable domain tests in oracle reply; using fallback");
            return fallback_cases(signature);
        }
        tracing::info!(cases = accepted.len(), "domain tests accepted");
        accepted
    }

    /// Fill the prompt template.
    pub fn build_prompt(
        &self,
        goal: &str,
        code: &str,
        signature: &Signature,
        generic: &[TestCase],
    ) -> String {
        let parameters = if signature.parameters.is_empty() {
            "(none)".to_string()
        } else {
            signature
                .parameters
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let covered = if generic.is_empty() {
            "(none)".to_string()
        } else {
            generic
                .iter()
                .map(|c| format!("- {}", c.name))
                .collect::<Vec<_>>()
                .join("\n")
        };

        fill_template(
            DOMAIN_TESTS_PROMPT,
            &[
                ("goal", goal.trim()),
                ("code", code.trim()),
                ("signature", signature.to_string().as_str()),
                ("parameters", parameters.as_str()),
                ("covered", covered.as_str()),
                ("min_cases", self.config.min_cases.to_string().as_str()),
                ("max_cases", self.config.max_cases.to_string().as_str()),
                ("min_args", signature.required_count().to_string().as_str()),
                ("max_args", signature.total_count().to_string().as_str()),
            ],
        )
    }

    /// Parse, validate, sanitize, and name the candidates in a reply.
    fn accept(&self, reply: &str, signature: &Signature, generic: &[TestCase]) -> Vec<TestCase> {
        let candidates: Vec<Result<ValidCandidate, String>> = match parse_candidates(reply) {
            Candidates::Strict(items) | Candidates::Repaired(items) => items
                .iter()
                .map(|c| validate_candidate(c, signature))
                .collect(),
            Candidates::Scanned(pairs) => pairs
                .into_iter()
                .map(|(name, description)| scanned_candidate(name, description, signature))
                .collect(),
            Candidates::Nothing => return Vec::new(),
        };

        let mut names = NameSet::with_taken(generic.iter().map(|c| c.name.as_str()));
        let mut accepted = Vec::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            match candidate {
                Ok(valid) => {
                    let name = names.claim(&domain_name(&valid.name));
                    accepted.push(self.to_case(name, valid));
                }
                Err(reason) => {
                    tracing::warn!(index, reason = %reason, "dropped domain test candidate");
                }
            }
            if accepted.len() >= self.config.max_cases {
                break;
            }
        }
        accepted
    }

    fn to_case(&self, name: String, valid: ValidCandidate) -> TestCase {
        let max = self.config.max_field_len;
        let mut case = TestCase::new(
            name,
            sanitize(&valid.description, max),
            valid.inputs,
            Provenance::Oracle,
        )
        .with_reasoning(sanitize(&valid.reasoning, max));
        if let Some(expected) = valid.expected_output {
            case = case.expecting(expected);
        }
        if valid.should_throw {
            let error = valid
                .expected_error
                .map(|e| ident(&sanitize(&e, max)))
                .filter(|e| e != "param");
            case = case.throwing(error.as_deref());
        }
        case
    }
}

/// A candidate that passed validation, before sanitization.
#[derive(Debug)]
struct ValidCandidate {
    name: String,
    description: String,
    reasoning: String,
    inputs: Vec<TestValue>,
    expected_output: Option<TestValue>,
    should_throw: bool,
    expected_error: Option<String>,
}

fn field<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    obj.get(camel).or_else(|| obj.get(snake))
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Result<String, String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(_) => Err(format!("'{key}' must be a non-empty string")),
        None => Err(format!("missing '{key}'")),
    }
}

/// Check a raw candidate against the signature. Returns the reason on rejection.
fn validate_candidate(candidate: &Value, signature: &Signature) -> Result<ValidCandidate, String> {
    let obj = candidate
        .as_object()
        .ok_or_else(|| "candidate is not an object".to_string())?;

    let name = non_empty_str(obj, "name")?;
    let description = non_empty_str(obj, "description")?;
    let reasoning = non_empty_str(obj, "reasoning")?;

    let inputs = match obj.get("inputs") {
        Some(Value::Array(items)) => items.iter().map(TestValue::from_json).collect::<Vec<_>>(),
        Some(_) => return Err("'inputs' must be an array".to_string()),
        None => return Err("missing 'inputs'".to_string()),
    };
    if !signature.accepts_arity(inputs.len()) {
        return Err(format!(
            "{} inputs outside [{}, {}]",
            inputs.len(),
            signature.required_count(),
            signature.total_count()
        ));
    }

    let should_throw = match field(obj, "shouldThrow", "should_throw") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err("'shouldThrow' must be a boolean".to_string()),
    };

    let expected_output = field(obj, "expectedOutput", "expected_output")
        .filter(|_| !should_throw)
        .map(TestValue::from_json);
    let expected_error = field(obj, "expectedError", "expected_error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty());

    Ok(ValidCandidate {
        name,
        description,
        reasoning,
        inputs,
        expected_output,
        should_throw,
        expected_error,
    })
}

/// A scanned name/description pair becomes a placeholder with typical inputs.
fn scanned_candidate(
    name: String,
    description: String,
    signature: &Signature,
) -> Result<ValidCandidate, String> {
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err("scanned pair has an empty name or description".to_string());
    }
    Ok(ValidCandidate {
        name,
        description,
        reasoning: SCANNED_REASONING.to_string(),
        inputs: signature
            .parameters
            .iter()
            .map(|p| values::typical(values::param_kind(p)))
            .collect(),
        expected_output: None,
        should_throw: false,
        expected_error: None,
    })
}

/// Remove markup and interpolation markers, then bound the length.
pub fn sanitize(text: &str, max_len: usize) -> String {
    let cleaned = text
        .replace("${", "")
        .replace("{{", "")
        .replace("}}", "")
        .replace(['<', '>', '`'], "");
    let trimmed = cleaned.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }
    trimmed.chars().take(max_len).collect()
}

/// Normalize an oracle-supplied name to `domain_<identifier>`.
fn domain_name(raw: &str) -> String {
    let base = ident(&raw.to_lowercase());
    let base: String = base.chars().take(64).collect();
    if base.starts_with("domain_") {
        base
    } else {
        format!("domain_{base}")
    }
}

/// Signature-only cases used whenever the oracle cannot be used.
pub fn fallback_cases(signature: &Signature) -> Vec<TestCase> {
    let kinds: Vec<ValueKind> = signature
        .parameters
        .iter()
        .map(values::param_kind)
        .collect();
    let typical: Vec<TestValue> = kinds.iter().map(|k| values::typical(*k)).collect();

    let mut cases = vec![TestCase::new(
        "fallback_typical_inputs",
        "Typical inputs derived from the signature",
        typical.clone(),
        Provenance::Fallback,
    )];

    if kinds.iter().any(|k| values::is_container_or_text(*k)) {
        cases.push(TestCase::new(
            "fallback_empty_inputs",
            "Empty text and container inputs",
            kinds.iter().map(|k| values::empty(*k)).collect(),
            Provenance::Fallback,
        ));
    }

    cases.push(TestCase::new(
        "fallback_return_type",
        format!("Result is consistent with declared return type '{}'", signature.return_type),
        typical,
        Provenance::Fallback,
    ));
    cases
}
