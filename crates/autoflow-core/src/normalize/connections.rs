use std::collections::HashMap;

use serde_json::Value;

use super::push_warning;
use crate::Workflow;

/// A plan edge before resolution. Labels in the platform-native form are
/// display names; free-form labels may be ids or names.
struct RawEdge {
    from: String,
    to: String,
    from_is_name: bool,
    to_is_name: bool,
}

impl RawEdge {
    fn free(from: String, to: String) -> Self {
        Self {
            from,
            to,
            from_is_name: false,
            to_is_name: false,
        }
    }
}

/// Resolve the plan's edges onto `workflow.connections`.
///
/// Sources are read from `connections` (keyed by node id or name) and from an
/// optional `edges: [{from, to}]` array. Free-form labels resolve by id first,
/// then by name; labels in the platform-native `{"main": [[{"node": ..}]]}`
/// form resolve by name first. Edges with an unknown endpoint are dropped.
/// When nothing resolves and there are at least two nodes, the nodes are
/// chained in input order.
pub(super) fn build_connections(raw: &Value, workflow: &mut Workflow, warnings: &mut Vec<String>) {
    let mut pairs: Vec<RawEdge> = Vec::new();

    match raw.get("connections") {
        Some(Value::Object(map)) => {
            for (source, value) in map {
                let from_is_name = matches!(value, Value::Object(obj) if obj.contains_key("main"));
                let mut targets = Vec::new();
                collect_targets(value, false, &mut targets);
                pairs.extend(targets.into_iter().map(|(to, to_is_name)| RawEdge {
                    from: source.clone(),
                    to,
                    from_is_name,
                    to_is_name,
                }));
            }
        }
        Some(Value::Array(edges)) => collect_edge_list(edges, &mut pairs),
        Some(Value::Null) | None => {}
        Some(other) => push_warning(
            warnings,
            format!("Connections ignored: expected an object, got {}", other),
        ),
    }
    if let Some(Value::Array(edges)) = raw.get("edges") {
        collect_edge_list(edges, &mut pairs);
    }

    let lookup = Lookup::new(workflow);
    let mut resolved = Vec::with_capacity(pairs.len());
    for edge in &pairs {
        match (
            lookup.resolve(&edge.from, edge.from_is_name),
            lookup.resolve(&edge.to, edge.to_is_name),
        ) {
            (Some(f), Some(t)) => resolved.push((f.to_string(), t.to_string())),
            _ => push_warning(
                warnings,
                format!("Edge {} -> {} dropped: node not found", edge.from, edge.to),
            ),
        }
    }

    for (from, to) in &resolved {
        workflow.connect(from, to);
    }

    if workflow.connections.is_empty() && workflow.nodes.len() >= 2 {
        let names: Vec<String> = workflow.nodes.iter().map(|n| n.name.clone()).collect();
        for pair in names.windows(2) {
            workflow.connect(&pair[0], &pair[1]);
        }
        push_warning(
            warnings,
            format!("No edges in plan; chained {} nodes in order", names.len()),
        );
    }
}

/// Node labels to display names.
struct Lookup {
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl Lookup {
    fn new(workflow: &Workflow) -> Self {
        Self {
            by_id: workflow
                .nodes
                .iter()
                .map(|n| (n.id.clone(), n.name.clone()))
                .collect(),
            by_name: workflow
                .nodes
                .iter()
                .map(|n| (n.name.clone(), n.name.clone()))
                .collect(),
        }
    }

    /// Ids shadow names on collision unless `name_first` is set.
    fn resolve(&self, label: &str, name_first: bool) -> Option<&str> {
        let (first, second) = if name_first {
            (&self.by_name, &self.by_id)
        } else {
            (&self.by_id, &self.by_name)
        };
        first
            .get(label)
            .or_else(|| second.get(label))
            .map(String::as_str)
    }
}

/// Accepts `"b"`, `["b", "c"]`, `[{"node": "b"}]`, and the platform-native
/// `{"main": [[{"node": "b", "type": "main", "index": 0}]]}`. Each target is
/// paired with whether it came from a `node` field, which holds a name.
fn collect_targets(value: &Value, is_name: bool, out: &mut Vec<(String, bool)>) {
    match value {
        Value::String(s) => out.push((s.clone(), is_name)),
        Value::Number(n) => out.push((n.to_string(), is_name)),
        Value::Array(items) => {
            for item in items {
                collect_targets(item, is_name, out);
            }
        }
        Value::Object(obj) => {
            if let Some(node) = obj.get("node") {
                collect_targets(node, true, out);
            } else if let Some(main) = obj.get("main") {
                collect_targets(main, is_name, out);
            }
        }
        Value::Null | Value::Bool(_) => {}
    }
}

fn collect_edge_list(edges: &[Value], out: &mut Vec<RawEdge>) {
    for edge in edges {
        let from = edge.get("from").or_else(|| edge.get("source")).and_then(label);
        let to = edge.get("to").or_else(|| edge.get("target")).and_then(label);
        if let (Some(from), Some(to)) = (from, to) {
            out.push(RawEdge::free(from, to));
        }
    }
}

fn label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
