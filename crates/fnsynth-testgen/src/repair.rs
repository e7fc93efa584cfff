//! Best-effort recovery of test candidates from oracle replies.
//!
//! Strict JSON is tried first. Only if that fails is the text repaired and
//! re-parsed, and only if that fails too are `name`/`description` pairs
//! scanned out of the raw text.

use fnsynth_oracle::reply::json_payload;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// What the parse chain recovered, and how.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates {
    Strict(Vec<Value>),
    Repaired(Vec<Value>),
    /// `(name, description)` pairs only; inputs must be supplied by the caller.
    Scanned(Vec<(String, String)>),
    Nothing,
}

/// Run the strict → repair → manual-scan chain over an oracle reply.
pub fn parse_candidates(reply: &str) -> Candidates {
    let payload = json_payload(reply);

    if let Ok(value) = serde_json::from_str::<Value>(&payload)
        && let Some(items) = candidate_array(value)
    {
        return Candidates::Strict(items);
    }

    let repaired = repair_json(&payload);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired)
        && let Some(items) = candidate_array(value)
    {
        tracing::debug!("oracle reply needed JSON repair");
        return Candidates::Repaired(items);
    }

    let pairs = scan_name_descriptions(&payload);
    if pairs.is_empty() {
        Candidates::Nothing
    } else {
        tracing::debug!(pairs = pairs.len(), "recovered candidates by manual scan");
        Candidates::Scanned(pairs)
    }
}

/// Accept a bare array, an object wrapping one, or a single candidate object.
fn candidate_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            for key in ["tests", "testCases", "test_cases", "cases"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Some(items);
                }
            }
            map.contains_key("name").then(|| vec![Value::Object(map)])
        }
        _ => None,
    }
}

/// Repair common JSON mistakes in generated text.
///
/// Strips code fences, normalizes curly and single quotes, quotes bare keys
/// and bare word values, maps `undefined`/`NaN`/`Infinity` to `null`, and
/// drops trailing commas. String contents are never rewritten except for
/// escaping.
pub fn repair_json(text: &str) -> String {
    let stripped: String = text
        .lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");
    let normalized = stripped
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let chars: Vec<char> = normalized.chars().collect();
    let mut out = String::with_capacity(normalized.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            ',' => {
                let next = skip_whitespace(&chars, i + 1);
                if !matches!(chars.get(next), Some(']' | '}')) {
                    out.push(',');
                }
                i += 1;
            }
            '-' | '0'..='9' if c != '-' || chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '+' | '-'))
                {
                    i += 1;
                }
                out.extend(&chars[start..i]);
            }
            '-' if chars.get(i + 1).is_some_and(|n| n.is_alphabetic()) => {
                let mut end = i + 1;
                while end < chars.len() && chars[end].is_alphanumeric() {
                    end += 1;
                }
                let word: String = chars[i + 1..end].iter().collect();
                if matches!(word.as_str(), "undefined" | "NaN" | "Infinity") {
                    out.push_str("null");
                    i = end;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let is_key = chars.get(skip_whitespace(&chars, i)) == Some(&':');
                if is_key {
                    out.push_str(&quote(&word));
                } else {
                    match word.as_str() {
                        "true" | "false" | "null" => out.push_str(&word),
                        "undefined" | "NaN" | "Infinity" => out.push_str("null"),
                        _ => out.push_str(&quote(&word)),
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn quote(word: &str) -> String {
    serde_json::to_string(word).unwrap_or_else(|_| "\"\"".to_string())
}

/// Copy a quoted string starting at `start` as a double-quoted JSON string.
/// Returns the index just past the closing quote (or the end of input).
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let delim = chars[start];
    let mut i = start + 1;
    out.push('"');
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if next == '\'' {
                    // \' is not a valid JSON escape
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(next);
                }
                i += 2;
                continue;
            }
            c if c == delim => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        i += 1;
    }
    out.push('"');
    i
}

/// Pull `name`/`description` pairs out of text that is not valid JSON.
///
/// The text is cut into top-level `{...}` objects (the last one may be
/// unterminated); each object contributes its first `name` and first
/// `description`, in whichever order they appear. Objects missing either key
/// are skipped.
pub fn scan_name_descriptions(text: &str) -> Vec<(String, String)> {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    static DESC_RE: OnceLock<Regex> = OnceLock::new();
    let name_re = NAME_RE.get_or_init(|| {
        Regex::new(r#"["']?\bname["']?\s*:\s*["“']([^"”'\n]+)["”']"#).unwrap()
    });
    let desc_re = DESC_RE.get_or_init(|| {
        Regex::new(r#"["']?\bdescription["']?\s*:\s*["“']([^"”'\n]+)["”']"#).unwrap()
    });

    let mut chunks = object_chunks(text);
    if chunks.is_empty() {
        chunks.push(text);
    }
    chunks
        .into_iter()
        .filter_map(|chunk| {
            let name = name_re.captures(chunk)?;
            let desc = desc_re.captures(chunk)?;
            Some((name[1].trim().to_string(), desc[1].trim().to_string()))
        })
        .collect()
}

/// Top-level brace-delimited spans of `text`. Braces inside double-quoted
/// strings do not count. An object still open at the end runs to the end.
fn object_chunks(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' || c == '\n' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(open) = start.take()
                {
                    chunks.push(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    if let Some(open) = start {
        chunks.push(&text[open..]);
    }
    chunks
}
