//! Signature-only test synthesis.
//!
//! Pure and deterministic: the same signature always yields the same list
//! in the same order. Categories are emitted in a fixed order (normal, edge
//! case, null/undefined inputs, boundaries, malformed types, empty values,
//! large values).

use crate::values::{self, ValueKind};
use fnsynth_core::{Provenance, Signature, TestCase, TestValue};
use std::collections::HashSet;

/// Build the generic test corpus for `signature`.
pub fn synthesize_generic(signature: &Signature) -> Vec<TestCase> {
    let kinds: Vec<ValueKind> = signature.parameters.iter().map(values::param_kind).collect();
    let typical: Vec<TestValue> = kinds.iter().map(|k| values::typical(*k)).collect();
    let mut names = NameSet::default();
    let mut cases = Vec::new();

    cases.push(case(
        names.claim("normal"),
        "Typical value for every parameter",
        typical.clone(),
    ));
    cases.push(case(
        names.claim("edge_case"),
        "Awkward but valid value for every parameter",
        kinds.iter().map(|k| values::edge(*k)).collect(),
    ));

    for (i, param) in signature.parameters.iter().enumerate() {
        if !param.is_required() {
            continue;
        }
        let p = ident(&param.name);
        cases.push(
            case(
                names.claim(&format!("null_input_{p}")),
                format!("null passed for required parameter '{}'", param.name),
                with_input(&typical, i, TestValue::Null),
            )
            .throwing(Some("TypeError")),
        );
        cases.push(
            case(
                names.claim(&format!("undefined_input_{p}")),
                format!("undefined passed for required parameter '{}'", param.name),
                with_input(&typical, i, TestValue::Undefined),
            )
            .throwing(Some("TypeError")),
        );
    }

    for (i, (param, kind)) in signature.parameters.iter().zip(&kinds).enumerate() {
        let p = ident(&param.name);
        for variant in values::boundaries(*kind) {
            let mut tc = case(
                names.claim(&format!("boundary_{p}_{}", variant.name)),
                format!("Boundary value '{}' for '{}'", variant.name, param.name),
                with_input(&typical, i, variant.value),
            );
            if variant.should_throw {
                tc = tc.throwing(None);
            }
            cases.push(tc);
        }
    }

    for (i, (param, kind)) in signature.parameters.iter().zip(&kinds).enumerate() {
        let p = ident(&param.name);
        for variant in values::malformed(*kind) {
            cases.push(
                case(
                    names.claim(&format!("malformed_{p}_{}", variant.name)),
                    format!("Wrong runtime type ({}) for '{}'", variant.name, param.name),
                    with_input(&typical, i, variant.value),
                )
                .throwing(Some("TypeError")),
            );
        }
    }

    cases.push(case(
        names.claim("empty_values"),
        "Minimal value for every parameter at once",
        kinds.iter().map(|k| values::empty(*k)).collect(),
    ));

    for (i, (param, kind)) in signature.parameters.iter().zip(&kinds).enumerate() {
        if let Some(value) = values::large(*kind) {
            let p = ident(&param.name);
            cases.push(case(
                names.claim(&format!("large_{p}")),
                format!("Large value for '{}'", param.name),
                with_input(&typical, i, value),
            ));
        }
    }

    tracing::debug!(
        signature = %signature,
        cases = cases.len(),
        "generic tests synthesized"
    );
    cases
}

fn case(name: String, description: impl Into<String>, inputs: Vec<TestValue>) -> TestCase {
    TestCase::new(name, description, inputs, Provenance::Generic)
}

fn with_input(base: &[TestValue], index: usize, value: TestValue) -> Vec<TestValue> {
    let mut inputs = base.to_vec();
    inputs[index] = value;
    inputs
}

/// Reduce a parameter name to identifier characters.
pub(crate) fn ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "param".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hands out unique names, suffixing `_2`, `_3`, … on collision.
#[derive(Debug, Default)]
pub(crate) struct NameSet {
    taken: HashSet<String>,
}

impl NameSet {
    pub(crate) fn with_taken<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: names.into_iter().map(String::from).collect(),
        }
    }

    pub(crate) fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
