use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::{layout_position, push_warning};
use crate::{Catalog, MAIL_SEND_KIND, Node, ParameterSet, Position, deep_merge};

/// Parameter keys that are dropped when their value is empty.
pub const OPTIONAL_PARAMETER_KEYS: [&str; 5] = ["cc", "bcc", "replyTo", "attachments", "options"];

/// Build complete nodes from raw plan entries. Entries that are not objects
/// are skipped with a warning.
pub(super) fn build_nodes(raw_nodes: &[Value], catalog: &Catalog, warnings: &mut Vec<String>) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut ids: HashSet<String> = HashSet::new();
    let mut names: HashSet<String> = HashSet::new();

    for (index, raw) in raw_nodes.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            push_warning(warnings, format!("Node #{} skipped: not an object", index));
            continue;
        };

        let id = unique_id(raw_id(obj).unwrap_or_else(|| default_id(index)), index, &mut ids, warnings);
        let name = unique_name(
            non_empty_str(obj, "name")
                .map(str::to_string)
                .unwrap_or_else(|| id.clone()),
            &mut names,
            warnings,
        );

        let kind = non_empty_str(obj, "type")
            .or_else(|| non_empty_str(obj, "kind"))
            .map(|k| catalog.resolve_kind(k.trim()).to_string())
            .unwrap_or_default();
        if kind.is_empty() {
            push_warning(warnings, format!("Node '{}' has no type", id));
        }

        let version = obj
            .get("typeVersion")
            .or_else(|| obj.get("version"))
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v >= 1)
            .unwrap_or(1);

        let position = obj
            .get("position")
            .and_then(parse_position)
            .unwrap_or_else(|| layout_position(index));

        let parameters = build_parameters(obj, &kind, catalog, &id, warnings);
        let credentials = resolve_credentials(obj, &kind, catalog, &id);

        nodes.push(Node {
            id,
            name,
            kind,
            version,
            position,
            parameters,
            credentials,
            disabled: obj.get("disabled").and_then(Value::as_bool).unwrap_or(false),
        });
    }

    nodes
}

fn default_id(index: usize) -> String {
    format!("node_{}", index + 1)
}

fn raw_id(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// A colliding id is replaced by the positional default, suffixed until free.
fn unique_id(
    candidate: String,
    index: usize,
    taken: &mut HashSet<String>,
    warnings: &mut Vec<String>,
) -> String {
    if taken.insert(candidate.clone()) {
        return candidate;
    }
    let base = default_id(index);
    let mut replacement = base.clone();
    let mut n = 2;
    while taken.contains(&replacement) {
        replacement = format!("{}_{}", base, n);
        n += 1;
    }
    push_warning(
        warnings,
        format!("Duplicate node id '{}' renamed to '{}'", candidate, replacement),
    );
    taken.insert(replacement.clone());
    replacement
}

fn unique_name(candidate: String, taken: &mut HashSet<String>, warnings: &mut Vec<String>) -> String {
    if taken.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    let mut replacement = format!("{} {}", candidate, n);
    while taken.contains(&replacement) {
        n += 1;
        replacement = format!("{} {}", candidate, n);
    }
    push_warning(
        warnings,
        format!("Duplicate node name '{}' renamed to '{}'", candidate, replacement),
    );
    taken.insert(replacement.clone());
    replacement
}

fn parse_position(value: &Value) -> Option<Position> {
    let coords = value.as_array()?;
    let [x, y] = coords.as_slice() else {
        return None;
    };
    let coord = |v: &Value| v.as_f64().map(|f| f.round() as i32);
    Some(Position {
        x: coord(x)?,
        y: coord(y)?,
    })
}

fn build_parameters(
    obj: &Map<String, Value>,
    kind: &str,
    catalog: &Catalog,
    id: &str,
    warnings: &mut Vec<String>,
) -> ParameterSet {
    let mut overrides = match obj.get("parameters") {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => ParameterSet::new(),
        Some(other) => {
            push_warning(
                warnings,
                format!("Node '{}' parameters ignored: expected an object, got {}", id, other),
            );
            ParameterSet::new()
        }
    };

    if kind == MAIL_SEND_KIND {
        rename_message_to_text(&mut overrides);
    }

    let mut params = match catalog.entry(kind) {
        Some(entry) => deep_merge(&entry.default_params, &overrides),
        None => overrides,
    };

    if kind == MAIL_SEND_KIND {
        rename_message_to_text(&mut params);
    }
    drop_empty_optionals(&mut params);
    params
}

/// Trigger kinds never carry credentials. Catalog kinds that need one keep the
/// supplied reference or get the placeholder; other catalog kinds get none.
/// Kinds unknown to the catalog pass their credentials through.
fn resolve_credentials(
    obj: &Map<String, Value>,
    kind: &str,
    catalog: &Catalog,
    id: &str,
) -> Option<ParameterSet> {
    let supplied = obj
        .get("credentials")
        .and_then(Value::as_object)
        .filter(|c| !c.is_empty())
        .cloned();

    match catalog.entry(kind) {
        Some(entry) if entry.requires_credential() => supplied.or_else(|| entry.credentials.clone()),
        Some(_) => {
            if supplied.is_some() {
                debug!("Stripped credentials from node '{}' ({})", id, kind);
            }
            None
        }
        None => supplied,
    }
}

/// Rename the mail body key `message` to `text`, keeping its position. An
/// existing `text` wins and `message` is discarded.
pub fn rename_message_to_text(params: &mut ParameterSet) {
    if !params.contains_key("message") {
        return;
    }
    let has_text = params.contains_key("text");
    let old = std::mem::take(params);
    for (key, value) in old {
        if key == "message" {
            if !has_text {
                params.insert("text".to_string(), value);
            }
        } else {
            params.insert(key, value);
        }
    }
}

/// Drop optional keys whose value is empty, at the top level and inside
/// `options`. An `options` object left empty is dropped too.
pub fn drop_empty_optionals(params: &mut ParameterSet) {
    if let Some(Value::Object(options)) = params.get_mut("options") {
        options.retain(|key, value| !(OPTIONAL_PARAMETER_KEYS.contains(&key.as_str()) && is_empty_value(value)));
    }
    params.retain(|key, value| !(OPTIONAL_PARAMETER_KEYS.contains(&key.as_str()) && is_empty_value(value)));
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
