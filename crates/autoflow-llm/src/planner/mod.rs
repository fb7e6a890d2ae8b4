mod parse;
mod prompt;


use crate::{ChatBackend, Message};
use anyhow::{Context, Result};
use autoflow_core::{Catalog, Normalized, normalize};
use parse::{parse_plan, truncate_for_log};
use prompt::planner_system_prompt;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Ask the backend for a raw candidate plan for `prompt`.
///
/// Transport and status failures are errors. A completion that is empty,
/// not JSON, or not a JSON object yields an empty object so that
/// normalization substitutes the fallback workflow.
pub async fn generate_plan(
    backend: &impl ChatBackend,
    prompt: &str,
    catalog: &Catalog,
) -> Result<Value> {
    let messages = vec![
        Message::system(planner_system_prompt(catalog)),
        Message::user(prompt),
    ];

    info!(model = backend.model_name(), "Requesting workflow plan");
    let response = backend
        .chat(messages)
        .await
        .context("Plan generation request failed")?;

    let Some(text) = response.first_text() else {
        warn!("Plan generation returned no content, using empty plan");
        return Ok(Value::Object(Default::default()));
    };
    debug!("Raw plan completion: {}", truncate_for_log(text));

    match parse_plan(text) {
        Ok(plan) => Ok(Value::Object(plan)),
        Err(reason) => {
            warn!("Unusable plan completion ({}), using empty plan", reason);
            Ok(Value::Object(Default::default()))
        }
    }
}

/// Generate a plan for `prompt` and normalize it against `catalog`.
pub async fn plan_workflow(
    backend: &impl ChatBackend,
    prompt: &str,
    catalog: &Catalog,
) -> Result<Normalized> {
    let raw = generate_plan(backend, prompt, catalog).await?;
    Ok(normalize(&raw, catalog))
}
