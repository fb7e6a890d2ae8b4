use serde_json::{Map, Value};

/// Extract JSON from text that may be wrapped in markdown code fences. A
/// fence that is never closed (e.g. a truncated completion) is still stripped.
pub(crate) fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let after_fence = if let Some(start) = trimmed.find("```json") {
        &trimmed[start + 7..]
    } else if let Some(start) = trimmed.find("```") {
        &trimmed[start + 3..]
    } else {
        return trimmed;
    };
    match after_fence.find("```") {
        Some(end) => after_fence[..end].trim(),
        None => after_fence.trim(),
    }
}

/// Parse a completion into a raw plan object.
///
/// Returns `Err` with a short reason when the text is not a JSON object.
pub(crate) fn parse_plan(text: &str) -> Result<Map<String, Value>, String> {
    let json_text = extract_json(text);
    if json_text.is_empty() {
        return Err("empty completion".to_string());
    }
    match serde_json::from_str::<Value>(json_text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("top-level value is {}, not an object", kind_of(&other))),
        Err(e) => Err(format!("not valid JSON: {}", e)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= 120 {
        return text.to_string();
    }
    let head: String = text.chars().take(117).collect();
    format!("{}...", head)
}
