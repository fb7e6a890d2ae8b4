use std::collections::HashSet;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::{Catalog, Workflow};

/// Top-level keys a workflow document may carry.
pub const ALLOWED_TOP_LEVEL_FIELDS: [&str; 4] = ["name", "nodes", "connections", "active"];

/// Node keys that must be present in a workflow document.
const REQUIRED_NODE_FIELDS: [&str; 4] = ["id", "name", "type", "parameters"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Workflow has no nodes")]
    EmptyGraph,

    #[error("Node {node} is missing field '{field}'")]
    MissingNodeField { node: String, field: String },

    #[error("Duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("Duplicate node name '{0}'")]
    DuplicateNodeName(String),

    #[error("Edge {from} -> {to} references a node that does not exist")]
    DanglingEdge { from: String, to: String },

    #[error("Node '{node}' is missing required parameters: {}", keys.join(", "))]
    MissingRequiredParameter { node: String, keys: Vec<String> },

    #[error("Unexpected top-level field '{0}'")]
    UnexpectedField(String),

    #[error("Malformed workflow document: {0}")]
    Malformed(String),
}

/// Every violation found in one validation pass. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s): ", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn violations(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    fn from_vec(errors: Vec<ValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }
}

/// Check a typed workflow against the shape contract and the catalog's
/// per-kind required parameters. Reports every violation, not just the first.
pub fn validate_workflow(workflow: &Workflow, catalog: &Catalog) -> Result<(), ValidationErrors> {
    ValidationErrors::from_vec(collect_violations(workflow, catalog))
}

/// Validate a raw workflow document (what actually goes over the wire).
///
/// Adds the checks a typed `Workflow` cannot express: unknown top-level
/// fields and node objects missing keys. Returns the parsed workflow on success.
pub fn validate_document(doc: &Value, catalog: &Catalog) -> Result<Workflow, ValidationErrors> {
    let Some(obj) = doc.as_object() else {
        return Err(ValidationErrors(vec![ValidationError::Malformed(
            "expected a JSON object".to_string(),
        )]));
    };

    let mut errors: Vec<ValidationError> = obj
        .keys()
        .filter(|k| !ALLOWED_TOP_LEVEL_FIELDS.contains(&k.as_str()))
        .map(|k| ValidationError::UnexpectedField(k.clone()))
        .collect();

    match obj.get("nodes") {
        Some(Value::Array(nodes)) => {
            if nodes.is_empty() {
                errors.push(ValidationError::EmptyGraph);
            }
            for (i, node) in nodes.iter().enumerate() {
                let label = node
                    .get("id")
                    .and_then(Value::as_str)
                    .map(|id| format!("'{}'", id))
                    .unwrap_or_else(|| format!("#{}", i));
                let Some(node) = node.as_object() else {
                    errors.push(ValidationError::Malformed(format!(
                        "node {} is not an object",
                        label
                    )));
                    continue;
                };
                for field in REQUIRED_NODE_FIELDS {
                    if node.get(field).is_none_or(Value::is_null) {
                        errors.push(ValidationError::MissingNodeField {
                            node: label.clone(),
                            field: field.to_string(),
                        });
                    }
                }
            }
        }
        Some(_) => errors.push(ValidationError::Malformed("'nodes' is not an array".into())),
        None => errors.push(ValidationError::EmptyGraph),
    }

    // Typed checks only make sense once the document has the right shape.
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let workflow: Workflow = serde_json::from_value(doc.clone())
        .map_err(|e| ValidationErrors(vec![ValidationError::Malformed(e.to_string())]))?;
    validate_workflow(&workflow, catalog)?;
    Ok(workflow)
}

fn collect_violations(workflow: &Workflow, catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if workflow.nodes.is_empty() {
        errors.push(ValidationError::EmptyGraph);
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, node) in workflow.nodes.iter().enumerate() {
        let label = if node.id.trim().is_empty() {
            format!("#{}", i)
        } else {
            format!("'{}'", node.id)
        };
        for (field, value) in [("id", &node.id), ("name", &node.name), ("type", &node.kind)] {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingNodeField {
                    node: label.clone(),
                    field: field.to_string(),
                });
            }
        }
        if !node.id.is_empty() && !ids.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId(node.id.clone()));
        }
        if !node.name.is_empty() && !names.insert(node.name.as_str()) {
            errors.push(ValidationError::DuplicateNodeName(node.name.clone()));
        }
    }

    for edge in workflow.edges() {
        // The platform keys connections by display name only.
        if !names.contains(edge.from) || !names.contains(edge.to) {
            errors.push(ValidationError::DanglingEdge {
                from: edge.from.to_string(),
                to: edge.to.to_string(),
            });
        }
    }

    // Disabled nodes are still checked.
    for node in &workflow.nodes {
        let Some(entry) = catalog.entry(&node.kind) else {
            continue;
        };
        let missing = entry.missing_params(&node.parameters);
        if !missing.is_empty() {
            errors.push(ValidationError::MissingRequiredParameter {
                node: node.name.clone(),
                keys: missing,
            });
        }
    }

    errors
}
