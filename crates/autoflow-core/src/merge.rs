use serde_json::{Map, Value};

/// Deep-merge `overrides` onto `defaults`.
///
/// Keys only in `defaults` are taken from it. When both sides hold an object at
/// the same key the merge recurses; in every other case the override value wins
/// outright, including arrays. Key order follows `defaults`, with keys unique to
/// `overrides` appended in their own order.
pub fn deep_merge(defaults: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::with_capacity(defaults.len() + overrides.len());

    for (key, default) in defaults {
        let value = match (default, overrides.get(key)) {
            (Value::Object(d), Some(Value::Object(o))) => Value::Object(deep_merge(d, o)),
            (_, Some(o)) => o.clone(),
            (d, None) => d.clone(),
        };
        merged.insert(key.clone(), value);
    }

    for (key, value) in overrides {
        if !defaults.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}
