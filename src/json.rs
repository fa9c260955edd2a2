//! Locating a JSON object inside free-form model output.

use serde_json::{Map, Value};

/// Span from the first `{` to the last `}` in `text`, inclusive.
///
/// The match is greedy on purpose: braces in surrounding prose end up inside
/// the span and make the parse fail, which callers treat as a malformed
/// response.
pub fn greedy_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the greedy object span of `text` as a JSON object.
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, String> {
    let span = greedy_object_span(text).ok_or_else(|| "no JSON object in response".to_string())?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("response JSON is not an object".to_string()),
        Err(e) => Err(format!("failed to parse JSON: {}", e)),
    }
}
