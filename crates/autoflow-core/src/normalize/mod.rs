//! Graph normalizer: turns a loosely-shaped plan into a complete workflow.
//!
//! Every repair happens here, before validation. Skipped nodes, dropped edges
//! and renamed duplicates are reported as warnings rather than errors.

mod connections;
mod nodes;

#[cfg(test)]
mod tests;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{Catalog, MAIL_SEND_KIND, Position, SCHEDULER_KIND, Workflow, generate_workflow_name};

pub use nodes::{OPTIONAL_PARAMETER_KEYS, drop_empty_optionals, rename_message_to_text};

pub const LAYOUT_BASE_X: i32 = 240;
pub const LAYOUT_STEP_X: i32 = 220;
pub const LAYOUT_BASE_Y: i32 = 300;
pub const LAYOUT_STEP_Y: i32 = 120;

/// Default canvas position for the node at `index`. Consecutive nodes
/// alternate between two rows so labels never overlap.
pub fn layout_position(index: usize) -> Position {
    let index = i32::try_from(index).unwrap_or(i32::MAX / LAYOUT_STEP_X);
    Position {
        x: LAYOUT_BASE_X.saturating_add(index.saturating_mul(LAYOUT_STEP_X)),
        y: LAYOUT_BASE_Y + (index % 2) * LAYOUT_STEP_Y,
    }
}

/// Result of normalizing a raw plan.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub workflow: Workflow,
    /// Set when the plan had no usable nodes and the fixed two-node workflow
    /// was substituted.
    pub fallback: bool,
    pub warnings: Vec<String>,
}

/// Normalize `raw` under a freshly generated workflow name.
pub fn normalize(raw: &Value, catalog: &Catalog) -> Normalized {
    normalize_named(raw, catalog, generate_workflow_name())
}

/// Normalize `raw` under a caller-chosen workflow name. Output is fully
/// determined by the inputs.
pub fn normalize_named(raw: &Value, catalog: &Catalog, name: impl Into<String>) -> Normalized {
    let name = name.into();
    let mut warnings = Vec::new();

    let raw_nodes = raw
        .get("nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let nodes = nodes::build_nodes(raw_nodes, catalog, &mut warnings);
    if nodes.is_empty() {
        push_warning(
            &mut warnings,
            "Plan contained no usable nodes; substituting the fallback workflow".to_string(),
        );
        return Normalized {
            workflow: fallback_workflow(catalog, name),
            fallback: true,
            warnings,
        };
    }

    let mut workflow = Workflow {
        name,
        nodes,
        ..Workflow::new("")
    };
    connections::build_connections(raw, &mut workflow, &mut warnings);

    info!(
        "Normalized workflow '{}': {} nodes, {} edges, {} warnings",
        workflow.name,
        workflow.nodes.len(),
        workflow.edge_count(),
        warnings.len()
    );

    Normalized {
        workflow,
        fallback: false,
        warnings,
    }
}

/// The fixed two-node workflow: a schedule trigger feeding a notification mail.
pub fn fallback_workflow(catalog: &Catalog, name: impl Into<String>) -> Workflow {
    let raw = json!({
        "nodes": [
            {"id": "trigger", "name": "Schedule Trigger", "type": SCHEDULER_KIND},
            {"id": "notify", "name": "Send Notification", "type": MAIL_SEND_KIND}
        ]
    });
    let mut warnings = Vec::new();
    let nodes = nodes::build_nodes(
        raw["nodes"].as_array().map(Vec::as_slice).unwrap_or_default(),
        catalog,
        &mut warnings,
    );
    debug!("Built fallback workflow ({} warnings)", warnings.len());

    let mut workflow = Workflow {
        name: name.into(),
        nodes,
        ..Workflow::new("")
    };
    workflow.connect("Schedule Trigger", "Send Notification");
    workflow
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{}", message);
    warnings.push(message);
}
