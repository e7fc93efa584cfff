//! Literal values used as test inputs and expected outputs.
//!
//! JSON cannot express `undefined`, `NaN`, `-0`, dates, patterns, or
//! functions, so inputs are modelled as [`TestValue`] and rendered to
//! JavaScript source when the harness is assembled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TestValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<TestValue>),
    /// Key order is preserved in the rendered literal.
    Object(Vec<(String, TestValue)>),
    /// A JavaScript expression emitted verbatim, e.g. `new Date(0)`.
    Expr(String),
}

impl TestValue {
    pub fn str(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn expr(e: impl Into<String>) -> Self {
        Self::Expr(e.into())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, TestValue)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Convert a parsed JSON value. Objects keep serde_json's key order.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as a JavaScript expression.
    pub fn to_js(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => js_number(*n),
            Self::String(s) => js_string(s),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(Self::to_js).collect();
                format!("[{}]", parts.join(", "))
            }
            Self::Object(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", js_string(k), v.to_js()))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Self::Expr(e) => format!("({})", e),
        }
    }
}

/// Quote a string as a JavaScript literal (JSON string syntax is valid JS).
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        format!("{:e}", n)
    }
}
