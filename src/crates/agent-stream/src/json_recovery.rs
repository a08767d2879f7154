//! Recovery of JSON objects embedded in prose.
//!
//! Brace matching is string-aware: braces inside JSON strings (including
//! escaped quotes) do not count.

use serde_json::{Map, Value};

/// The balanced `{...}` starting at byte `start`, which must be `{`.
pub fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    if !text[start..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every balanced object in `text`, in order of its opening brace. Nested
/// objects are included.
pub fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{')
        .filter_map(move |(start, _)| balanced_object_at(text, start))
}

/// Parses `candidate` as a JSON object.
pub fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

pub fn first_object(text: &str) -> Option<Map<String, Value>> {
    balanced_objects(text).find_map(parse_object)
}

/// The longest balanced object that parses; ties go to the earlier one.
pub fn largest_object(text: &str) -> Option<Map<String, Value>> {
    let mut candidates: Vec<&str> = balanced_objects(text).collect();
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));
    candidates.into_iter().find_map(parse_object)
}

/// Contents of each ```` ``` ```` fenced block, without the info string.
pub fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
        let body = &after_fence[body_start..];
        match body.find("```") {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + 3..];
            }
            None => break,
        }
    }
    blocks
}

/// Removes a surrounding code fence, if the whole text is one fenced block.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return trimmed,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"x {"a":"}{","b":"\"}"} y"#;
        assert_eq!(balanced_object_at(text, 2), Some(r#"{"a":"}{","b":"\"}"}"#));
    }

    #[test]
    fn unbalanced_object_is_none() {
        assert_eq!(balanced_object_at("{\"a\":{}", 0), None);
        assert_eq!(balanced_object_at("abc", 0), None);
    }

    #[test]
    fn first_and_largest_differ_for_nested_candidates() {
        let text = r#"note {bad} then {"outer":{"inner":1},"k":2}"#;
        let first = first_object(text).unwrap();
        assert!(first.contains_key("outer"));
        let largest = largest_object(text).unwrap();
        assert!(largest.contains_key("k"));

        let text = r#"{"a":1} and {"b":2,"c":3}"#;
        assert!(first_object(text).unwrap().contains_key("a"));
        assert!(largest_object(text).unwrap().contains_key("b"));
    }

    #[test]
    fn finds_fenced_blocks() {
        let text = "intro\n```json\n{\"a\":1}\n```\nmid\n```\nplain\n```";
        assert_eq!(fenced_blocks(text), vec!["{\"a\":1}\n", "plain\n"]);
    }

    #[test]
    fn strips_fence_around_whole_text() {
        assert_eq!(strip_code_fence("  ```json\n{\"a\":1}\n```  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn arrays_are_not_objects() {
        assert!(parse_object("[1,2]").is_none());
        assert!(parse_object(" {} ").is_some());
    }
}
