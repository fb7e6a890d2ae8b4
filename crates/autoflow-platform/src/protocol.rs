use autoflow_core::Workflow;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Session login body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a manual run request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest<'a> {
    pub workflow_data: &'a Workflow,
}

/// Summary of a stored workflow as returned by create and list calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Strip the `{"data": ...}` envelope the platform wraps responses in.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or_default(),
        other => other,
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "workflow id must be a string or number, got {}",
            other
        ))),
    }
}
