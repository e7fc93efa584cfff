//! Free-text user hints turned into test cases.
//!
//! Recognized phrasings (case-insensitive):
//! - `input 2, 3 should return 5`, `input "abc" -> "cba"`, `given [1, 2] returns 3`
//! - `input -1 should throw`, `input -1 throws RangeError`
//! - `should throw RangeError for input -1`
//!
//! Anything else becomes a "result is defined" case over typical inputs.

use crate::enhancer::sanitize;
use crate::repair::repair_json;
use crate::values::{self, split_top_level};
use fnsynth_core::{Provenance, Signature, TestCase, TestValue};
use regex::Regex;
use std::sync::OnceLock;

const MAX_HINT_LEN: usize = 500;

struct HintPatterns {
    throws_after: Regex,
    throws_before: Regex,
    returns: Regex,
}

fn patterns() -> &'static HintPatterns {
    static PATTERNS: OnceLock<HintPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HintPatterns {
        throws_after: Regex::new(
            r"(?i)^\s*(?:input|inputs|given|args?|arguments?)\s*:?\s*(.+?)\s*(?:should\s+throw|throws|must\s+throw)(?:\s+(?:an?\s+)?([A-Za-z_$][\w$]*))?\s*\.?\s*$",
        )
        .unwrap(),
        throws_before: Regex::new(
            r"(?i)^\s*(?:it\s+)?(?:should|must)\s+throw(?:\s+(?:an?\s+)?([A-Za-z_$][\w$]*))?\s+(?:for|when|on|with|given)\s+(?:input|inputs|args?|arguments?)?\s*:?\s*(.+?)\s*\.?\s*$",
        )
        .unwrap(),
        returns: Regex::new(
            r"(?i)^\s*(?:input|inputs|given|args?|arguments?)\s*:?\s*(.+?)\s*(?:should\s+(?:return|equal|be|give|output)|returns?|=>|->|==)\s*(.+?)\s*$",
        )
        .unwrap(),
    })
}

/// Parse user hints against `signature`. Names are `user_1`, `user_2`, …
pub fn parse_user_hints(hints: &[String], signature: &Signature) -> Vec<TestCase> {
    hints
        .iter()
        .filter(|h| !h.trim().is_empty())
        .enumerate()
        .map(|(i, hint)| parse_hint(&format!("user_{}", i + 1), hint, signature))
        .collect()
}

fn parse_hint(name: &str, hint: &str, signature: &Signature) -> TestCase {
    let p = patterns();
    let description = sanitize(hint, MAX_HINT_LEN);

    if let Some(caps) = p.throws_after.captures(hint) {
        let inputs = fit_arity(parse_value_list(&caps[1]), signature);
        let error = caps.get(2).map(|m| m.as_str()).filter(|e| is_error_name(e));
        return user_case(name, description, inputs).throwing(error);
    }
    if let Some(caps) = p.throws_before.captures(hint) {
        let inputs = fit_arity(parse_value_list(&caps[2]), signature);
        let error = caps.get(1).map(|m| m.as_str()).filter(|e| is_error_name(e));
        return user_case(name, description, inputs).throwing(error);
    }
    if let Some(caps) = p.returns.captures(hint) {
        let inputs = fit_arity(parse_value_list(&caps[1]), signature);
        let expected = parse_value(&caps[2]);
        return user_case(name, description, inputs).expecting(expected);
    }

    tracing::debug!(hint, "unrecognized hint; asserting a defined result");
    user_case(name, description, fit_arity(Vec::new(), signature))
}

fn user_case(name: &str, description: String, inputs: Vec<TestValue>) -> TestCase {
    TestCase::new(name, description, inputs, Provenance::User)
}

/// Error class names start with an uppercase letter (`TypeError`, `ParseError`).
fn is_error_name(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Split `2, 3` / `(2, 3)` / `"a", [1, 2]` into values.
fn parse_value_list(text: &str) -> Vec<TestValue> {
    let mut t = text.trim();
    if t.starts_with('(') && t.ends_with(')') {
        t = &t[1..t.len() - 1];
    }
    if t.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(t, ',')
        .into_iter()
        .map(parse_value)
        .collect()
}

/// Parse one literal; unquoted words become strings.
fn parse_value(text: &str) -> TestValue {
    let t = text.trim().trim_end_matches('.').trim();
    match t {
        "undefined" => return TestValue::Undefined,
        "NaN" => return TestValue::expr("Number.NaN"),
        "Infinity" => return TestValue::expr("Number.POSITIVE_INFINITY"),
        "-Infinity" => return TestValue::expr("Number.NEGATIVE_INFINITY"),
        _ => {}
    }
    if let Ok(value) = serde_json::from_str(t) {
        return TestValue::from_json(&value);
    }
    if let Ok(value) = serde_json::from_str(&repair_json(t)) {
        return TestValue::from_json(&value);
    }
    TestValue::str(t)
}

/// Pad with typical values up to the required count; truncate to the total.
fn fit_arity(mut inputs: Vec<TestValue>, signature: &Signature) -> Vec<TestValue> {
    let required = signature.required_count();
    let missing = required.saturating_sub(inputs.len());
    let padding: Vec<TestValue> = signature
        .parameters
        .iter()
        .skip(inputs.len())
        .take(missing)
        .map(|p| values::typical(values::param_kind(p)))
        .collect();
    inputs.extend(padding);
    inputs.truncate(signature.total_count());
    inputs
}
