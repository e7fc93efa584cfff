//! Runtime value kinds and the representative values used for each.

use fnsynth_core::{Parameter, TestValue};

/// Runtime category a declared type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    RegExp,
    Function,
    Unknown,
}

/// A named value in a per-kind table.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: &'static str,
    pub value: TestValue,
    pub should_throw: bool,
}

impl Variant {
    fn ok(name: &'static str, value: TestValue) -> Self {
        Self {
            name,
            value,
            should_throw: false,
        }
    }

    fn throwing(name: &'static str, value: TestValue) -> Self {
        Self {
            name,
            value,
            should_throw: true,
        }
    }
}

/// Classify a parameter; rest parameters classify by their element type.
pub fn param_kind(param: &Parameter) -> ValueKind {
    if param.rest {
        return classify(element_type(&param.type_annotation));
    }
    classify(&param.type_annotation)
}

/// `T[]` → `T`, `Array<T>` → `T`; anything else is returned unchanged.
fn element_type(type_annotation: &str) -> &str {
    let t = type_annotation.trim();
    if let Some(inner) = t.strip_suffix("[]") {
        return strip_parens(inner);
    }
    for prefix in ["Array<", "ReadonlyArray<"] {
        if let Some(inner) = t.strip_prefix(prefix).and_then(|r| r.strip_suffix('>')) {
            return inner.trim();
        }
    }
    t
}

fn strip_parens(t: &str) -> &str {
    let t = t.trim();
    if t.starts_with('(') && t.ends_with(')') && closing_paren(t) == Some(t.len() - 1) {
        return strip_parens(&t[1..t.len() - 1]);
    }
    t
}

/// Byte index of the paren closing the one at position 0.
fn closing_paren(t: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in t.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split at top-level occurrences of `sep`, ignoring nested brackets and quotes.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q && prev != '\\' {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => quote = Some(c),
                '(' | '[' | '{' | '<' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                // `=>` is not a closing angle bracket
                '>' if prev != '=' => depth -= 1,
                c if c == sep && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            }
        }
        prev = c;
    }
    parts.push(&text[start..]);
    parts
}

fn has_top_level_arrow(t: &str) -> bool {
    let mut depth = 0i32;
    let mut prev = '\0';
    for c in t.chars() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '>' if prev == '=' => {
                if depth == 0 {
                    return true;
                }
            }
            '>' => depth -= 1,
            _ => {}
        }
        prev = c;
    }
    false
}

/// Classify a declared type annotation.
pub fn classify(type_annotation: &str) -> ValueKind {
    let t = strip_parens(type_annotation);
    if t.is_empty() {
        return ValueKind::Unknown;
    }

    // Unions: first member that is not null/undefined/void.
    let members = split_top_level(t, '|');
    if members.len() > 1 {
        return members
            .into_iter()
            .map(str::trim)
            .find(|m| !m.is_empty() && !matches!(*m, "null" | "undefined" | "void"))
            .map_or(ValueKind::Unknown, classify);
    }

    if has_top_level_arrow(t) {
        return ValueKind::Function;
    }

    // Literal types
    if t.starts_with(['"', '\'', '`']) {
        return ValueKind::String;
    }
    if t == "true" || t == "false" {
        return ValueKind::Boolean;
    }
    if t.parse::<f64>().is_ok() {
        return ValueKind::Number;
    }

    if t.ends_with("[]") || t.starts_with('[') || t.starts_with("readonly ") {
        return ValueKind::Array;
    }
    if t.starts_with('{') {
        return ValueKind::Object;
    }

    let base = t.split('<').next().unwrap_or(t).trim();
    match base {
        "string" | "String" => ValueKind::String,
        "number" | "Number" => ValueKind::Number,
        "boolean" | "Boolean" => ValueKind::Boolean,
        "Array" | "ReadonlyArray" => ValueKind::Array,
        "object" | "Object" | "Record" | "Map" | "Partial" | "Readonly" => ValueKind::Object,
        "Date" => ValueKind::Date,
        "RegExp" => ValueKind::RegExp,
        "Function" => ValueKind::Function,
        _ => ValueKind::Unknown,
    }
}

fn expr(e: &str) -> TestValue {
    TestValue::expr(e)
}

fn num(n: f64) -> TestValue {
    TestValue::Number(n)
}

/// An ordinary, valid value.
pub fn typical(kind: ValueKind) -> TestValue {
    match kind {
        ValueKind::String => TestValue::str("hello"),
        ValueKind::Number => num(42.0),
        ValueKind::Boolean => TestValue::Bool(true),
        ValueKind::Array => TestValue::Array(vec![num(1.0), num(2.0), num(3.0)]),
        ValueKind::Object => TestValue::object([("key", TestValue::str("value"))]),
        ValueKind::Date => expr("new Date()"),
        ValueKind::RegExp => expr("/test/"),
        ValueKind::Function => expr("() => {}"),
        ValueKind::Unknown => TestValue::str("test"),
    }
}

/// An awkward but valid value.
pub fn edge(kind: ValueKind) -> TestValue {
    match kind {
        ValueKind::String => TestValue::str("こんにちは 🌍"),
        ValueKind::Number => expr("Number.MIN_VALUE"),
        ValueKind::Boolean => TestValue::Bool(false),
        ValueKind::Array => TestValue::Array(Vec::new()),
        ValueKind::Object => TestValue::Object(Vec::new()),
        ValueKind::Date => expr("new Date(\"invalid\")"),
        ValueKind::RegExp => expr("/(?:)/"),
        ValueKind::Function => expr("() => undefined"),
        ValueKind::Unknown => num(0.0),
    }
}

/// The minimal or zero value.
pub fn empty(kind: ValueKind) -> TestValue {
    match kind {
        ValueKind::String => TestValue::str(""),
        ValueKind::Number => num(0.0),
        ValueKind::Boolean => TestValue::Bool(false),
        ValueKind::Array => TestValue::Array(Vec::new()),
        ValueKind::Object => TestValue::Object(Vec::new()),
        ValueKind::Date => expr("new Date(0)"),
        ValueKind::RegExp => expr("/(?:)/"),
        ValueKind::Function => expr("() => {}"),
        ValueKind::Unknown => TestValue::Undefined,
    }
}

/// Boundary values. For numbers exactly the non-finite ones are expected to throw.
pub fn boundaries(kind: ValueKind) -> Vec<Variant> {
    match kind {
        ValueKind::Number => vec![
            Variant::ok("zero", num(0.0)),
            Variant::ok("negative_one", num(-1.0)),
            Variant::throwing("positive_infinity", expr("Number.POSITIVE_INFINITY")),
            Variant::throwing("negative_infinity", expr("Number.NEGATIVE_INFINITY")),
            Variant::throwing("nan", expr("Number.NaN")),
            Variant::ok("negative_zero", num(-0.0)),
        ],
        ValueKind::String => vec![
            Variant::ok("empty", TestValue::str("")),
            Variant::ok("long_10000", expr("\"a\".repeat(10000)")),
            Variant::ok("emoji", TestValue::str("👨‍👩‍👧‍👦🎉")),
            Variant::ok("null_char", TestValue::str("\0")),
            Variant::ok("newline", TestValue::str("line1\nline2")),
        ],
        ValueKind::Array => vec![
            Variant::ok("empty", TestValue::Array(Vec::new())),
            Variant::ok("single", TestValue::Array(vec![num(1.0)])),
            Variant::ok("large_1000", expr("Array.from({ length: 1000 }, (_, i) => i)")),
        ],
        ValueKind::Boolean => vec![
            Variant::ok("true", TestValue::Bool(true)),
            Variant::ok("false", TestValue::Bool(false)),
        ],
        ValueKind::Object => vec![
            Variant::ok("empty", TestValue::Object(Vec::new())),
            Variant::ok("single_key", TestValue::object([("a", num(1.0))])),
            Variant::ok(
                "nested",
                TestValue::object([(
                    "a",
                    TestValue::object([("b", TestValue::object([("c", num(1.0))]))]),
                )]),
            ),
        ],
        ValueKind::Date => vec![
            Variant::ok("epoch", expr("new Date(0)")),
            Variant::ok("far_future", expr("new Date(8640000000000000)")),
            Variant::ok("invalid", expr("new Date(Number.NaN)")),
        ],
        ValueKind::RegExp => vec![
            Variant::ok("empty", expr("/(?:)/")),
            Variant::ok("global", expr("/a/g")),
            Variant::ok("unicode", expr("/\\p{L}+/u")),
        ],
        ValueKind::Function => vec![
            Variant::ok("noop", expr("() => {}")),
            Variant::ok("identity", expr("(x: unknown) => x")),
            Variant::ok("async", expr("async () => undefined")),
        ],
        ValueKind::Unknown => vec![
            Variant::ok("zero", num(0.0)),
            Variant::ok("empty_string", TestValue::str("")),
            Variant::ok("empty_object", TestValue::Object(Vec::new())),
            Variant::ok("empty_array", TestValue::Array(Vec::new())),
            Variant::ok("false", TestValue::Bool(false)),
        ],
    }
}

/// Values of the wrong runtime type. Empty for `Unknown`.
pub fn malformed(kind: ValueKind) -> Vec<Variant> {
    let object = || TestValue::Object(Vec::new());
    match kind {
        ValueKind::String => vec![
            Variant::throwing("number", num(12345.0)),
            Variant::throwing("object", object()),
        ],
        ValueKind::Number => vec![
            Variant::throwing("string", TestValue::str("42")),
            Variant::throwing("boolean", TestValue::Bool(true)),
            Variant::throwing("object", object()),
        ],
        ValueKind::Boolean => vec![
            Variant::throwing("string", TestValue::str("true")),
            Variant::throwing("number", num(1.0)),
            Variant::throwing("object", object()),
        ],
        ValueKind::Array => vec![
            Variant::throwing("string", TestValue::str("not an array")),
            Variant::throwing("array_like", TestValue::object([("length", num(0.0))])),
        ],
        ValueKind::Object => vec![
            Variant::throwing("string", TestValue::str("not an object")),
            Variant::throwing("number", num(42.0)),
        ],
        ValueKind::Date => vec![
            Variant::throwing("string", TestValue::str("2024-01-01")),
            Variant::throwing("number", num(0.0)),
        ],
        ValueKind::RegExp => vec![
            Variant::throwing("string", TestValue::str("[a-z]+")),
            Variant::throwing("number", num(1.0)),
        ],
        ValueKind::Function => vec![
            Variant::throwing("string", TestValue::str("not a function")),
            Variant::throwing("object", object()),
        ],
        ValueKind::Unknown => Vec::new(),
    }
}

/// A large representative, for the kinds that have one.
pub fn large(kind: ValueKind) -> Option<TestValue> {
    match kind {
        ValueKind::Number => Some(expr("Number.MAX_SAFE_INTEGER")),
        ValueKind::String => Some(expr("\"x\".repeat(100000)")),
        ValueKind::Array => Some(expr("Array.from({ length: 10000 }, (_, i) => i)")),
        ValueKind::Object => Some(expr(
            "Object.fromEntries(Array.from({ length: 1000 }, (_, i) => [\"key\" + i, i]))",
        )),
        _ => None,
    }
}

/// True for parameter kinds that can meaningfully be "empty".
pub fn is_container_or_text(kind: ValueKind) -> bool {
    matches!(
        kind,
        ValueKind::String | ValueKind::Array | ValueKind::Object
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_primitives() {
        assert_eq!(classify("string"), ValueKind::String);
        assert_eq!(classify("number"), ValueKind::Number);
        assert_eq!(classify("boolean"), ValueKind::Boolean);
        assert_eq!(classify("any"), ValueKind::Unknown);
        assert_eq!(classify("T"), ValueKind::Unknown);
        assert_eq!(classify(""), ValueKind::Unknown);
    }

    #[test]
    fn test_classify_unions_and_literals() {
        assert_eq!(classify("string | null"), ValueKind::String);
        assert_eq!(classify("undefined | number"), ValueKind::Number);
        assert_eq!(classify("'asc' | 'desc'"), ValueKind::String);
        assert_eq!(classify("1 | 2 | 3"), ValueKind::Number);
        assert_eq!(classify("null | undefined"), ValueKind::Unknown);
    }

    #[test]
    fn test_classify_containers() {
        assert_eq!(classify("number[]"), ValueKind::Array);
        assert_eq!(classify("Array<string>"), ValueKind::Array);
        assert_eq!(classify("readonly string[]"), ValueKind::Array);
        assert_eq!(classify("[number, number]"), ValueKind::Array);
        assert_eq!(classify("Record<string, number>"), ValueKind::Object);
        assert_eq!(classify("{ a: number }"), ValueKind::Object);
        assert_eq!(classify("Map<string, number>"), ValueKind::Object);
    }

    #[test]
    fn test_classify_functions() {
        assert_eq!(classify("(a: number) => string"), ValueKind::Function);
        assert_eq!(classify("() => string[]"), ValueKind::Function);
        assert_eq!(classify("(() => void)[]"), ValueKind::Array);
        assert_eq!(classify("Function"), ValueKind::Function);
    }

    #[test]
    fn test_classify_dates_and_patterns() {
        assert_eq!(classify("Date"), ValueKind::Date);
        assert_eq!(classify("RegExp | string"), ValueKind::RegExp);
    }

    #[test]
    fn test_rest_parameter_uses_element_type() {
        let p = Parameter::new("nums", "number[]").rest();
        assert_eq!(param_kind(&p), ValueKind::Number);
        let p = Parameter::new("items", "Array<string>").rest();
        assert_eq!(param_kind(&p), ValueKind::String);
    }

    #[test]
    fn test_number_boundaries_throw_only_when_non_finite() {
        let throwing: Vec<&str> = boundaries(ValueKind::Number)
            .iter()
            .filter(|v| v.should_throw)
            .map(|v| v.name)
            .collect();
        assert_eq!(
            throwing,
            vec!["positive_infinity", "negative_infinity", "nan"]
        );
    }

    #[test]
    fn test_typical_date_is_now_and_function_is_noop() {
        assert_eq!(typical(ValueKind::Date).to_js(), "new Date()");
        assert_eq!(typical(ValueKind::Function).to_js(), "() => {}");
    }

    #[test]
    fn test_unknown_has_no_malformed_or_large() {
        assert!(malformed(ValueKind::Unknown).is_empty());
        assert!(large(ValueKind::Unknown).is_none());
        assert!(large(ValueKind::Boolean).is_none());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a: Map<string, number>, b: [1, 2]", ','),
            vec!["a: Map<string, number>", " b: [1, 2]"]
        );
        assert_eq!(split_top_level("'a,b', 3", ','), vec!["'a,b'", " 3"]);
    }
}
