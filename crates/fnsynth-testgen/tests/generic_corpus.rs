use fnsynth_core::{Parameter, Provenance, Signature, TestValue};
use fnsynth_testgen::values::{boundaries, classify};
use fnsynth_testgen::{fallback_cases, parse_user_hints, synthesize_generic};
use std::collections::HashSet;

fn sig(params: Vec<Parameter>, ret: &str) -> Signature {
    Signature::new("target", params, ret)
}

#[test]
fn test_single_parameter_of_every_kind_gets_ten_cases() {
    for ty in [
        "string", "number", "boolean", "number[]", "Record<string, number>", "Date", "RegExp",
        "() => void", "unknown",
    ] {
        let cases = synthesize_generic(&sig(vec![Parameter::new("x", ty)], "void"));
        assert!(
            cases.len() >= 10,
            "type {ty} produced only {} generic cases",
            cases.len()
        );
    }
}

#[test]
fn test_two_numbers() {
    let cases = synthesize_generic(&sig(
        vec![Parameter::new("a", "number"), Parameter::new("b", "number")],
        "number",
    ));
    let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(&names[..2], &["normal", "edge_case"]);
    for expected in [
        "null_input_a",
        "undefined_input_b",
        "boundary_a_zero",
        "boundary_b_nan",
        "malformed_a_string",
        "large_b",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert_eq!(cases.len(), 27);
}

#[test]
fn test_every_boundary_value_appears_once_per_parameter() {
    let signature = sig(
        vec![Parameter::new("s", "string"), Parameter::new("n", "number")],
        "string",
    );
    let cases = synthesize_generic(&signature);

    for (index, param) in signature.parameters.iter().enumerate() {
        let kind = classify(&param.type_annotation);
        for variant in boundaries(kind) {
            let name = format!("boundary_{}_{}", param.name, variant.name);
            let matching: Vec<_> = cases.iter().filter(|c| c.name == name).collect();
            assert_eq!(matching.len(), 1, "expected exactly one {name}");
            assert_eq!(matching[0].inputs[index], variant.value);
            assert_eq!(matching[0].should_throw, variant.should_throw);
        }
    }
}

#[test]
fn test_non_finite_numbers_throw_and_finite_do_not() {
    let cases = synthesize_generic(&sig(vec![Parameter::new("n", "number")], "number"));
    let throws = |name: &str| {
        cases
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.should_throw)
            .unwrap()
    };
    assert!(throws("boundary_n_nan"));
    assert!(throws("boundary_n_positive_infinity"));
    assert!(!throws("boundary_n_zero"));
    assert!(!throws("boundary_n_negative_zero"));
}

#[test]
fn test_optional_parameters_get_no_null_cases() {
    let cases = synthesize_generic(&sig(
        vec![
            Parameter::new("s", "string"),
            Parameter::new("limit", "number").optional(),
        ],
        "string",
    ));
    assert!(cases.iter().any(|c| c.name == "null_input_s"));
    assert!(!cases.iter().any(|c| c.name == "null_input_limit"));
}

#[test]
fn test_zero_parameters() {
    let cases = synthesize_generic(&sig(Vec::new(), "number"));
    assert!(cases.iter().all(|c| c.inputs.is_empty()));
    assert!(cases.iter().any(|c| c.name == "normal"));
}

#[test]
fn test_names_are_unique_and_generic_provenance() {
    let cases = synthesize_generic(&sig(
        vec![
            Parameter::new("a b", "string"),
            Parameter::new("a-b", "string"),
            Parameter::new("rest", "number").rest(),
        ],
        "void",
    ));
    let unique: HashSet<&str> = cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(unique.len(), cases.len());
    assert!(cases.iter().all(|c| c.provenance == Provenance::Generic));
}

#[test]
fn test_deterministic() {
    let signature = sig(vec![Parameter::new("items", "string[]")], "number");
    assert_eq!(synthesize_generic(&signature), synthesize_generic(&signature));
}

#[test]
fn test_fallback_is_total() {
    for signature in [
        sig(Vec::new(), "void"),
        sig(vec![Parameter::new("x", "unknown")], "any"),
        sig(vec![Parameter::new("xs", "T[]")], "T"),
    ] {
        let cases = fallback_cases(&signature);
        assert!(!cases.is_empty());
        assert!(cases.iter().all(|c| c.provenance == Provenance::Fallback));
        assert!(cases.iter().all(|c| c.inputs.len() == signature.total_count()));
    }
}

#[test]
fn test_user_hints_join_the_corpus() {
    let signature = sig(
        vec![Parameter::new("a", "number"), Parameter::new("b", "number")],
        "number",
    );
    let hints = vec![
        "input 2, 3 should return 5".to_string(),
        "should throw RangeError for input 1, -1".to_string(),
    ];
    let cases = parse_user_hints(&hints, &signature);
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].expected_output, Some(TestValue::Number(5.0)));
    assert!(cases[1].should_throw);
    assert_eq!(cases[1].expected_error.as_deref(), Some("RangeError"));
    assert!(cases.iter().all(|c| c.provenance == Provenance::User));
}
