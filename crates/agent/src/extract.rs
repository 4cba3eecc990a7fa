//! Tool-call extraction from free-form model output.
//!
//! Small local models rarely emit clean JSON. They wrap the call in prose,
//! fence it in markdown, or pass numbers and arrays where strings were asked
//! for. The extractor scans for balanced top-level objects and decodes the
//! first one that looks like `{"tool": "...", "params": {...}}`.

use repochat_core::tool::ToolInvocation;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How one model response should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// No object-shaped text at all: the response is the answer.
    FinalAnswer(String),
    /// A decodable tool call.
    ToolCall(ToolInvocation),
    /// Something object-shaped was present but nothing decoded. Callers treat
    /// this the same as `FinalAnswer`.
    Unparseable(String),
}

/// Classify a model response. Never fails.
pub fn extract(text: &str) -> Extraction {
    let mut saw_candidate = false;
    let mut cursor = 0;

    while let Some(rel) = text[cursor..].find('{') {
        let start = cursor + rel;
        saw_candidate = true;

        let Some(len) = find_object_end(&text[start..]) else {
            // Never closed: a stray brace, keep scanning after it
            cursor = start + 1;
            continue;
        };

        if let Some(call) = decode_candidate(&text[start..start + len]) {
            return Extraction::ToolCall(call);
        }
        cursor = start + len;
    }

    if saw_candidate {
        Extraction::Unparseable(text.to_string())
    } else {
        Extraction::FinalAnswer(text.to_string())
    }
}

/// Byte length of the balanced object starting at `input[0] == '{'`.
fn find_object_end(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in input.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

fn decode_candidate(candidate: &str) -> Option<ToolInvocation> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate) else {
        return None;
    };

    let name = object.get("tool")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let params = match ["params", "parameters", "arguments"]
        .iter()
        .find_map(|key| object.get(*key))
    {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => coerce_params(map),
        Some(_) => return None,
    };

    Some(ToolInvocation {
        name: name.to_string(),
        params,
    })
}

fn coerce_params(map: &Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .filter_map(|(key, value)| coerce_value(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Render one JSON value as a parameter string. `null` has no rendering.
fn coerce_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) => {
            let mut parts = Vec::new();
            flatten_into(value, &mut parts);
            Some(parts.join(","))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn flatten_into(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten_into(item, parts)),
        other => parts.extend(coerce_value(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(text: &str) -> ToolInvocation {
        match extract(text) {
            Extraction::ToolCall(call) => call,
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn plain_prose_is_final_answer() {
        let text = "The latest commit fixed the parser.";
        assert_eq!(extract(text), Extraction::FinalAnswer(text.into()));
    }

    #[test]
    fn bare_call() {
        let call = tool_call(r#"{"tool": "history-log", "params": {"limit": "5"}}"#);
        assert_eq!(call.name, "history-log");
        assert_eq!(call.param("limit"), Some("5"));
    }

    #[test]
    fn call_embedded_in_prose() {
        let call = tool_call(
            "Sure, let me look.\n```json\n{\"tool\": \"read-entry\", \"params\": {\"path\": \"src/main.rs\"}}\n```\nOne moment.",
        );
        assert_eq!(call.name, "read-entry");
        assert_eq!(call.param("path"), Some("src/main.rs"));
    }

    #[test]
    fn params_are_optional() {
        let call = tool_call(r#"{"tool": "list-entries"}"#);
        assert_eq!(call.name, "list-entries");
        assert!(call.params.is_empty());
    }

    #[test]
    fn parameter_aliases_accepted() {
        let call = tool_call(r#"{"tool": "read-entry", "arguments": {"path": "a.txt"}}"#);
        assert_eq!(call.param("path"), Some("a.txt"));
        let call = tool_call(r#"{"tool": "read-entry", "parameters": {"path": "b.txt"}}"#);
        assert_eq!(call.param("path"), Some("b.txt"));
    }

    #[test]
    fn values_are_coerced_to_strings() {
        let call = tool_call(
            r#"{"tool": "t", "params": {"n": 5, "f": 1.5, "b": true, "s": "x", "gone": null, "o": {"k": [1, 2]}}}"#,
        );
        assert_eq!(call.param("n"), Some("5"));
        assert_eq!(call.param("f"), Some("1.5"));
        assert_eq!(call.param("b"), Some("true"));
        assert_eq!(call.param("s"), Some("x"));
        assert_eq!(call.param("o"), Some(r#"{"k":[1,2]}"#));
        assert!(!call.params.contains_key("gone"));
    }

    #[test]
    fn arrays_are_comma_joined() {
        let call = tool_call(r#"{"tool": "t", "params": {"paths": ["a", "b"], "deep": [1, [2, [3]], null]}}"#);
        assert_eq!(call.param("paths"), Some("a,b"));
        assert_eq!(call.param("deep"), Some("1,2,3"));
    }

    #[test]
    fn unknown_fields_ignored() {
        let call = tool_call(r#"{"thought": "need history", "tool": "history-log", "confidence": 0.9}"#);
        assert_eq!(call.name, "history-log");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scanner() {
        let call = tool_call(r#"{"tool": "read-entry", "params": {"path": "we}ird{name\"}.txt"}}"#);
        assert_eq!(call.param("path"), Some("we}ird{name\"}.txt"));
    }

    #[test]
    fn first_decodable_candidate_wins() {
        let text = r#"Example shape: {"name": "x"}. Calling now: {"tool": "list-entries", "params": {"path": "src"}} and later {"tool": "history-log"}"#;
        let call = tool_call(text);
        assert_eq!(call.name, "list-entries");
        assert_eq!(call.param("path"), Some("src"));
    }

    #[test]
    fn object_without_tool_is_unparseable() {
        let text = r#"Here is some data: {"answer": 42}"#;
        assert_eq!(extract(text), Extraction::Unparseable(text.into()));
    }

    #[test]
    fn non_string_tool_is_unparseable() {
        assert!(matches!(extract(r#"{"tool": 7}"#), Extraction::Unparseable(_)));
        assert!(matches!(extract(r#"{"tool": ""}"#), Extraction::Unparseable(_)));
    }

    #[test]
    fn malformed_json_is_unparseable() {
        assert!(matches!(
            extract(r#"{"tool": "history-log", "params": {limit: 5}}"#),
            Extraction::Unparseable(_)
        ));
    }

    #[test]
    fn unbalanced_brace_is_unparseable() {
        assert!(matches!(
            extract(r#"I will call {"tool": "history-log", "params": {"limit": "5"}"#),
            Extraction::Unparseable(_)
        ));
    }

    #[test]
    fn stray_brace_before_call_is_skipped() {
        let call = tool_call(r#"I'll check the {src dir first. {"tool": "list-entries", "params": {"path": "src"}}"#);
        assert_eq!(call.name, "list-entries");
        assert_eq!(call.param("path"), Some("src"));
    }

    #[test]
    fn stray_brace_after_call_is_harmless() {
        let call = tool_call(r#"{"tool": "history-log"} and then {maybe more"#);
        assert_eq!(call.name, "history-log");
    }

    #[test]
    fn non_object_params_rejects_candidate() {
        assert!(matches!(
            extract(r#"{"tool": "read-entry", "params": "src/main.rs"}"#),
            Extraction::Unparseable(_)
        ));
    }

    #[test]
    fn closing_brace_alone_is_final_answer() {
        assert!(matches!(extract("a } b"), Extraction::FinalAnswer(_)));
    }

    #[test]
    fn multibyte_text_around_call() {
        let call = tool_call("Je vérifie… {\"tool\": \"read-entry\", \"params\": {\"path\": \"día.txt\"}} ✓");
        assert_eq!(call.param("path"), Some("día.txt"));
    }
}
