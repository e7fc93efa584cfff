//! Helpers for pulling usable payloads out of free-form oracle replies.

/// Strip `<think>...</think>` blocks that some models (qwen3, deepseek) emit.
pub fn strip_think_blocks(text: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = result.find("<think>") {
        if let Some(end_offset) = result[start..].find("</think>") {
            let end = start + end_offset + "</think>".len();
            result = format!("{}{}", &result[..start], &result[end..]);
        } else {
            // Unclosed think block: truncate from <think> onward
            result.truncate(start);
            break;
        }
    }
    result
}

/// A fenced block: its info string (language tag) and body.
struct Fence<'a> {
    lang: &'a str,
    body: &'a str,
}

fn fenced_blocks(text: &str) -> Vec<Fence<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let (lang, body_start) = match after.find('\n') {
            Some(nl) => (after[..nl].trim(), nl + 1),
            None => break,
        };
        let body_region = &after[body_start..];
        let Some(end) = body_region.find("```") else {
            // Unterminated fence: take everything that follows.
            blocks.push(Fence {
                lang,
                body: body_region,
            });
            break;
        };
        blocks.push(Fence {
            lang,
            body: &body_region[..end],
        });
        rest = &body_region[end + 3..];
    }
    blocks
}

const CODE_LANGS: &[&str] = &["ts", "typescript", "tsx", "js", "javascript"];

/// Extract candidate source code from an oracle reply.
///
/// Prefers a fenced block tagged as TypeScript/JavaScript, then the first
/// fenced block of any kind, then the whole reply. Returns an empty string
/// when the reply carries no code at all.
pub fn extract_code(reply: &str) -> String {
    let text = strip_think_blocks(reply);
    let blocks = fenced_blocks(&text);

    let chosen = blocks
        .iter()
        .find(|b| CODE_LANGS.contains(&b.lang.to_lowercase().as_str()))
        .or_else(|| blocks.first())
        .map_or(text.as_str(), |b| b.body);

    chosen.trim().to_string()
}

/// Locate the JSON payload in a reply: `<solution>` tags, a bare
/// object/array, a ```json fence, or any fence, in that order.
pub fn json_payload(reply: &str) -> String {
    let text = strip_think_blocks(reply);

    if let Some(start) = text.find("<solution>") {
        let after = &text[start + "<solution>".len()..];
        if let Some(end) = after.find("</solution>") {
            return after[..end].trim().to_string();
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    let blocks = fenced_blocks(&text);
    if let Some(block) = blocks
        .iter()
        .find(|b| b.lang.eq_ignore_ascii_case("json"))
        .or_else(|| blocks.first())
    {
        return block.body.trim().to_string();
    }

    // Prose around a bare array: take the outermost brackets.
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']'))
        && start < end
    {
        return trimmed[start..=end].to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_think_blocks() {
        assert_eq!(strip_think_blocks("<think>hmm</think>answer"), "answer");
        assert_eq!(
            strip_think_blocks("a<think>x</think>b<think>y</think>c"),
            "abc"
        );
        assert_eq!(strip_think_blocks("keep<think>never closed"), "keep");
    }

    #[test]
    fn test_extract_code_prefers_typescript_fence() {
        let reply = "Here:\n```text\nnot code\n```\n```typescript\nfunction f(): number { return 1; }\n```\n";
        assert_eq!(extract_code(reply), "function f(): number { return 1; }");
    }

    #[test]
    fn test_extract_code_falls_back_to_first_fence() {
        let reply = "```\nconst x = 1;\n```";
        assert_eq!(extract_code(reply), "const x = 1;");
    }

    #[test]
    fn test_extract_code_whole_reply_without_fences() {
        assert_eq!(
            extract_code("  function g() {}\n"),
            "function g() {}"
        );
    }

    #[test]
    fn test_extract_code_unterminated_fence() {
        assert_eq!(extract_code("```ts\nlet a = 2;\n"), "let a = 2;");
    }

    #[test]
    fn test_extract_code_strips_thinking() {
        assert_eq!(extract_code("<think>plan</think>"), "");
    }

    #[test]
    fn test_json_payload_variants() {
        assert_eq!(json_payload("[1, 2]"), "[1, 2]");
        assert_eq!(json_payload("<solution>[3]</solution>"), "[3]");
        assert_eq!(json_payload("Sure!\n```json\n[{\"a\": 1}]\n```"), "[{\"a\": 1}]");
        assert_eq!(json_payload("The cases are [4, 5] as requested."), "[4, 5]");
    }
}
