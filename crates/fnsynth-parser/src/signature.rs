//! Extract the structural signature of the first callable in a source text.
//!
//! Extraction never fails on malformed code: tree-sitter recovers from syntax
//! errors, an unlocatable name becomes [`ANONYMOUS_NAME`], and a source with
//! no callable yields [`Signature::placeholder`]. Only empty input is an error.

use crate::treesitter::{node_text, parse_typescript};
use fnsynth_core::{ANONYMOUS_NAME, Parameter, Signature};
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Errors from signature extraction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("cannot extract a signature from empty source")]
    EmptySource,
}

/// A located callable: the function-like node and the name it is bound to.
struct Callable<'t> {
    node: Node<'t>,
    name: Option<String>,
}

/// Extract the signature of the first callable declared in `source`.
pub fn extract_signature(source: &str) -> Result<Signature, ExtractionError> {
    if source.trim().is_empty() {
        return Err(ExtractionError::EmptySource);
    }

    let Some(tree) = parse_typescript(source) else {
        return Ok(Signature::placeholder());
    };
    let root = tree.root_node();
    let throws = collect_throws(&root, source);

    let Some(callable) = find_callable(root, source) else {
        tracing::debug!("no callable found in source; using placeholder signature");
        let mut sig = Signature::placeholder();
        sig.throws = throws;
        return Ok(sig);
    };

    let is_async = has_child_kind(&callable.node, "async");
    let parameters = extract_parameters(&callable.node, source);
    let mut return_type = callable
        .node
        .child_by_field_name("return_type")
        .map(|n| strip_annotation(node_text(&n, source)))
        .unwrap_or_else(|| "any".to_string());
    if is_async {
        return_type = unwrap_promise(&return_type);
    }

    Ok(Signature {
        name: callable
            .name
            .unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
        parameters,
        return_type,
        throws,
        is_async,
    })
}

fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function"
            | "function_expression"
            | "function"
            | "generator_function"
            | "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "method_definition"
            | "method_signature"
    )
}

fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}

/// Pre-order search for the first callable declaration or assignment.
fn find_callable<'t>(node: Node<'t>, source: &str) -> Option<Callable<'t>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            // const add = (a, b) => a + b;  const f = function () {}
            "variable_declarator" | "public_field_definition" => {
                let value = child.child_by_field_name("value");
                if let Some(value) = value
                    && is_function_kind(value.kind())
                {
                    let name = child
                        .child_by_field_name("name")
                        .filter(|n| n.kind() == "identifier" || n.kind() == "property_identifier")
                        .map(|n| node_text(&n, source).to_string());
                    return Some(Callable { node: value, name });
                }
            }
            // module.exports = function () {};  handler = async () => {}
            "assignment_expression" => {
                if let Some(right) = child.child_by_field_name("right")
                    && is_function_kind(right.kind())
                {
                    let name = child
                        .child_by_field_name("left")
                        .map(|l| assignment_target_name(&l, source))
                        .filter(|n| !n.is_empty() && n != "exports" && n != "default");
                    return Some(Callable { node: right, name });
                }
            }
            kind if is_function_kind(kind) => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source).to_string());
                return Some(Callable { node: child, name });
            }
            _ => {}
        }
        if let Some(found) = find_callable(child, source) {
            return Some(found);
        }
    }
    None
}

/// Last segment of an assignment target: `a.b.c` → `c`.
fn assignment_target_name(node: &Node, source: &str) -> String {
    if node.kind() == "member_expression"
        && let Some(prop) = node.child_by_field_name("property")
    {
        return node_text(&prop, source).to_string();
    }
    node_text(node, source).trim().to_string()
}

fn extract_parameters(callable: &Node, source: &str) -> Vec<Parameter> {
    // Unparenthesized single-parameter arrow: x => x * 2
    if let Some(single) = callable.child_by_field_name("parameter") {
        return vec![Parameter::new(node_text(&single, source), "any")];
    }

    let Some(params) = callable.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut parameters = Vec::new();
    let mut cursor = params.walk();
    for (index, param) in params.named_children(&mut cursor).enumerate() {
        match param.kind() {
            "required_parameter" | "optional_parameter" => {
                if let Some(p) = extract_parameter(&param, index, source) {
                    parameters.push(p);
                }
            }
            // Plain JavaScript-style parameters inside an erroneous tree
            "identifier" => parameters.push(Parameter::new(node_text(&param, source), "any")),
            _ => {}
        }
    }
    parameters
}

fn extract_parameter(param: &Node, index: usize, source: &str) -> Option<Parameter> {
    let pattern = param.child_by_field_name("pattern");
    let type_annotation = param
        .child_by_field_name("type")
        .map(|t| strip_annotation(node_text(&t, source)))
        .unwrap_or_else(|| "any".to_string());
    let has_default = param.child_by_field_name("value").is_some();

    let (name, rest) = match pattern {
        Some(p) if p.kind() == "this" => return None,
        Some(p) if p.kind() == "rest_pattern" => {
            let inner = p.named_child(0);
            let name = inner
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(&n, source).to_string())
                .unwrap_or_else(|| format!("arg{}", index));
            (name, true)
        }
        Some(p) if p.kind() == "identifier" => (node_text(&p, source).to_string(), false),
        // Destructured object/array patterns have no single name.
        Some(_) | None => (format!("arg{}", index), false),
    };

    let mut parameter = Parameter::new(name, type_annotation);
    if param.kind() == "optional_parameter" || has_default {
        parameter = parameter.optional();
    }
    if rest {
        parameter = parameter.rest();
    }
    Some(parameter)
}

/// `: number` → `number`
fn strip_annotation(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix(':')
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Unwrap exactly one `Promise<…>` level.
fn unwrap_promise(return_type: &str) -> String {
    let trimmed = return_type.trim();
    if let Some(inner) = trimmed
        .strip_prefix("Promise<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

/// Collect error type names from `@throws` tags in `/** … */` comments.
fn collect_throws(root: &Node, source: &str) -> Vec<String> {
    static THROWS_RE: OnceLock<Regex> = OnceLock::new();
    let re = THROWS_RE.get_or_init(|| {
        Regex::new(r"@(?:throws?|exception)\s+(?:\{([^}]*)\}|([A-Za-z_$][\w$.]*))").unwrap()
    });

    let mut comments = Vec::new();
    collect_doc_comments(*root, source, &mut comments);

    let mut throws: Vec<String> = Vec::new();
    for comment in comments {
        for caps in re.captures_iter(comment) {
            let raw = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            for name in raw.split('|').map(str::trim).filter(|n| !n.is_empty()) {
                if !throws.iter().any(|t| t == name) {
                    throws.push(name.to_string());
                }
            }
        }
    }
    throws
}

fn collect_doc_comments<'s>(node: Node, source: &'s str, out: &mut Vec<&'s str>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "comment" {
            let text = node_text(&child, source);
            if text.starts_with("/**") {
                out.push(text);
            }
        } else {
            collect_doc_comments(child, source, out);
        }
    }
}
