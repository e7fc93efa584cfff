//! Candidate code plus a generated TypeScript harness, as one executable unit.
//!
//! Every case runs independently inside `__run`, which prints
//! `PASS: <name> (<ms>ms)` or `FAIL: <name> (<ms>ms) - <message>`. A final
//! `Tests: <p> passed, <f> failed, <t> total` line closes the run.

use fnsynth_core::value::js_string;
use fnsynth_core::{Signature, TestCase};
use fnsynth_tools::TestUnit;
use regex::Regex;

/// Identifier the harness binds the callable under test to.
const TARGET: &str = "__target";

const PRELUDE: &str = r#"
function __deepEqual(a: any, b: any): boolean {
  if (a === b) return true;
  if (typeof a === "number" && typeof b === "number") return Number.isNaN(a) && Number.isNaN(b);
  if (a instanceof Date && b instanceof Date) return a.getTime() === b.getTime();
  if (a instanceof RegExp && b instanceof RegExp) return String(a) === String(b);
  if (typeof a !== "object" || typeof b !== "object" || a === null || b === null) return false;
  if (Array.isArray(a) !== Array.isArray(b)) return false;
  const ka = Object.keys(a);
  const kb = Object.keys(b);
  if (ka.length !== kb.length) return false;
  return ka.every((k) => Object.prototype.hasOwnProperty.call(b, k) && __deepEqual(a[k], b[k]));
}

function __show(v: any): string {
  try {
    const s = JSON.stringify(v);
    return s === undefined ? String(v) : s;
  } catch {
    return String(v);
  }
}

async function __run(name: string, body: () => unknown): Promise<boolean> {
  const start = Date.now();
  try {
    await body();
    console.log(`PASS: ${name} (${Date.now() - start}ms)`);
    return true;
  } catch (e: any) {
    const message = e instanceof Error ? e.message : String(e);
    console.log(`FAIL: ${name} (${Date.now() - start}ms) - ${message.split("\n")[0]}`);
    return false;
  }
}
"#;

/// Build the test unit for `code` exercising `cases`.
pub fn assemble(code: &str, signature: &Signature, cases: &[TestCase]) -> TestUnit {
    let (code, target) = bind_target(code, signature);
    let returns_nothing = returns_nothing(&signature.return_type);

    let mut source = String::with_capacity(code.len() + cases.len() * 256 + PRELUDE.len());
    source.push_str(code.trim_end());
    source.push_str("\n\n// ---- generated test harness ----\n");
    source.push_str(PRELUDE);
    source.push_str("\n(async () => {\n");
    source.push_str(&format!("  const {TARGET}: any = {target};\n"));
    source.push_str("  let __passed = 0;\n  let __failed = 0;\n");

    for case in cases {
        source.push_str(&format!(
            "  if (await __run({}, async () => {{\n",
            js_string(&case.name)
        ));
        source.push_str(&case_body(case, signature.is_async, returns_nothing));
        source.push_str("  })) __passed++; else __failed++;\n");
    }

    source.push_str(
        "  console.log(`Tests: ${__passed} passed, ${__failed} failed, ${__passed + __failed} total`);\n",
    );
    source.push_str("  if (__failed > 0) (globalThis as any).process.exitCode = 1;\n");
    source.push_str("})();\n");

    TestUnit {
        source,
        case_names: cases.iter().map(|c| c.name.clone()).collect(),
    }
}

/// Make the callable addressable from the harness.
///
/// Named callables are referenced directly. Anonymous default exports and
/// `module.exports` assignments are rebound to a harness-local constant.
fn bind_target(code: &str, signature: &Signature) -> (String, String) {
    if !signature.is_anonymous() {
        return (code.to_string(), named_target(code, &signature.name));
    }
    for marker in ["export default ", "module.exports = ", "exports.default = "] {
        if let Some(pos) = code.find(marker) {
            let mut rebound = String::with_capacity(code.len() + 32);
            rebound.push_str(&code[..pos]);
            rebound.push_str("const __fnsynth_default = ");
            rebound.push_str(&code[pos + marker.len()..]);
            return (rebound, "__fnsynth_default".to_string());
        }
    }
    // Nothing to bind; every case will fail with a clear message.
    (
        code.to_string(),
        "(() => { throw new Error(\"callable under test not found\"); })".to_string(),
    )
}

/// Expression reaching a named callable from the harness scope. Callables
/// attached by member assignment (`utils.clamp = ...`) are only reachable
/// through their object.
fn named_target(code: &str, name: &str) -> String {
    let escaped = regex::escape(name);
    let declared = Regex::new(&format!(
        r"\b(?:function\s*\*?\s*|class\s+|(?:const|let|var)\s+){escaped}\b"
    ));
    if declared.is_ok_and(|re| re.is_match(code)) {
        return name.to_string();
    }
    let assigned = Regex::new(&format!(
        r"((?:[A-Za-z_$][\w$]*\.)+){escaped}\s*=[^=>]"
    ));
    if let Ok(re) = assigned
        && let Some(prefix) = re.captures(code).and_then(|c| c.get(1))
    {
        return format!("{}{name}", prefix.as_str());
    }
    name.to_string()
}

fn returns_nothing(return_type: &str) -> bool {
    matches!(return_type.trim(), "void" | "undefined" | "never")
}

fn case_body(case: &TestCase, is_async: bool, returns_nothing: bool) -> String {
    let args: Vec<String> = case.inputs.iter().map(|v| v.to_js()).collect();
    let call = if is_async {
        format!("await {TARGET}({})", args.join(", "))
    } else {
        format!("{TARGET}({})", args.join(", "))
    };

    let mut body = String::new();
    if case.should_throw {
        body.push_str("    let __threw = false;\n");
        body.push_str(&format!("    try {{\n      {call};\n    }} catch (e: any) {{\n"));
        body.push_str("      __threw = true;\n");
        if let Some(expected) = &case.expected_error {
            body.push_str("      const __name = e?.name ?? e?.constructor?.name;\n");
            body.push_str(&format!(
                "      if (__name !== {}) throw new Error(`expected {} but got ${{__name}}`);\n",
                js_string(expected),
                escape_template(expected)
            ));
        }
        body.push_str("    }\n");
        body.push_str("    if (!__threw) throw new Error(\"expected an error to be thrown\");\n");
    } else if let Some(expected) = &case.expected_output {
        body.push_str(&format!("    const __result = {call};\n"));
        body.push_str(&format!("    const __expected = {};\n", expected.to_js()));
        body.push_str(
            "    if (!__deepEqual(__result, __expected)) throw new Error(`expected ${__show(__expected)} but got ${__show(__result)}`);\n",
        );
    } else if returns_nothing {
        body.push_str(&format!("    {call};\n"));
    } else {
        body.push_str(&format!("    const __result = {call};\n"));
        body.push_str(
            "    if (__result === undefined) throw new Error(\"expected a defined result\");\n",
        );
    }
    body
}

/// Escape text for inclusion in a template literal.
fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnsynth_core::{Parameter, Provenance, TestValue};

    fn add() -> Signature {
        Signature::new(
            "add",
            vec![Parameter::new("a", "number"), Parameter::new("b", "number")],
            "number",
        )
    }

    fn case(name: &str, inputs: Vec<TestValue>) -> TestCase {
        TestCase::new(name, "d", inputs, Provenance::Generic)
    }

    #[test]
    fn test_unit_contains_code_and_every_case() {
        let cases = vec![
            case("normal", vec![TestValue::Number(1.0), TestValue::Number(2.0)])
                .expecting(TestValue::Number(3.0)),
            case("null_input_a", vec![TestValue::Null, TestValue::Number(2.0)])
                .throwing(Some("TypeError")),
        ];
        let unit = assemble(
            "function add(a: number, b: number): number { return a + b; }",
            &add(),
            &cases,
        );

        assert!(unit.source.starts_with("function add("));
        assert_eq!(unit.case_names, vec!["normal", "null_input_a"]);
        assert!(unit.source.contains("const __target: any = add;"));
        assert!(unit.source.contains("__run(\"normal\""));
        assert!(unit.source.contains("const __result = __target(1, 2);"));
        assert!(unit.source.contains("const __expected = 3;"));
        assert!(unit.source.contains("__target(null, 2);"));
        assert!(unit.source.contains("if (__name !== \"TypeError\")"));
        assert!(unit.source.contains("Tests: ${__passed} passed"));
    }

    #[test]
    fn test_async_calls_are_awaited() {
        let sig = add().with_async(true);
        let unit = assemble("async function add() {}", &sig, &[case("normal", vec![])]);
        assert!(unit.source.contains("await __target()"));
    }

    #[test]
    fn test_defined_assertion_skipped_for_void() {
        let sig = Signature::new("log", vec![], "void");
        let unit = assemble("function log(): void {}", &sig, &[case("normal", vec![])]);
        assert!(!unit.source.contains("expected a defined result"));
        let unit = assemble("function add() {}", &add(), &[case("normal", vec![])]);
        assert!(unit.source.contains("expected a defined result"));
    }

    #[test]
    fn test_anonymous_default_export_is_rebound() {
        let sig = Signature::placeholder();
        let unit = assemble(
            "export default function (x: number) { return x; }",
            &sig,
            &[case("normal", vec![TestValue::Number(1.0)])],
        );
        assert!(
            unit.source
                .starts_with("const __fnsynth_default = function (x: number)")
        );
        assert!(unit.source.contains("const __target: any = __fnsynth_default;"));
    }

    #[test]
    fn test_member_assigned_callable_is_reached_through_its_object() {
        let sig = Signature::new(
            "clamp",
            vec![
                Parameter::new("v", "number"),
                Parameter::new("lo", "number"),
                Parameter::new("hi", "number"),
            ],
            "number",
        );
        let code = "const utils: any = {};\nutils.clamp = (v: number, lo: number, hi: number): number => Math.min(Math.max(v, lo), hi);";
        let unit = assemble(code, &sig, &[case("normal", vec![TestValue::Number(5.0)])]);
        assert!(unit.source.contains("const __target: any = utils.clamp;"));

        let sig = Signature::new("add", vec![], "number");
        let unit = assemble(
            "module.exports.add = function (a: number, b: number) { return a + b; };",
            &sig,
            &[case("normal", vec![])],
        );
        assert!(unit.source.contains("const __target: any = module.exports.add;"));
    }

    #[test]
    fn test_declared_callable_keeps_bare_name() {
        let code = "function add(a: number, b: number) { return a + b; }\nexports.add = add;";
        let unit = assemble(code, &add(), &[case("normal", vec![])]);
        assert!(unit.source.contains("const __target: any = add;"));
    }

    #[test]
    fn test_exports_default_assignment_is_rebound() {
        let unit = assemble(
            "exports.default = function (x: number) { return x; };",
            &Signature::placeholder(),
            &[case("normal", vec![TestValue::Number(1.0)])],
        );
        assert!(
            unit.source
                .starts_with("const __fnsynth_default = function (x: number)")
        );
        assert!(unit.source.contains("const __target: any = __fnsynth_default;"));
    }

    #[test]
    fn test_case_names_are_quoted() {
        let unit = assemble(
            "function add() {}",
            &add(),
            &[case("weird \"name\" `x`", vec![])],
        );
        assert!(unit.source.contains(r#"__run("weird \"name\" `x`""#));
    }
}
