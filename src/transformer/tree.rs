//! Recursive payload tree walker.
//!
//! Walks an arbitrary JSON-shaped value, consulting the field matcher
//! at every object entry and applying the transit codec to matched
//! fields. The rebuilt tree preserves container shape and key order.

use crate::codec::{self, Operation};
use crate::config::TransformConfig;
use crate::matcher;
use crate::path;
use serde_json::{Map, Value};

/// Errors surfaced by a transform pass.
///
/// Codec failures are absorbed (the original value is kept); only the
/// tree depth guard fails closed.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("payload nesting exceeds the configured maximum of {max} levels")]
    DepthExceeded { max: usize },
}

/// Transform a payload tree.
///
/// Matched fields are encoded or decoded per `operation`; everything
/// else is rebuilt unchanged. Input deeper than
/// `settings.max_tree_depth` is rejected rather than truncated.
pub fn transform(
    data: &Value,
    operation: Operation,
    config: &TransformConfig,
) -> Result<Value, TransformError> {
    walk(data, operation, config, "", 0)
}

fn walk(
    data: &Value,
    operation: Operation,
    config: &TransformConfig,
    field_path: &str,
    depth: usize,
) -> Result<Value, TransformError> {
    if depth > config.settings.max_tree_depth {
        return Err(TransformError::DepthExceeded {
            max: config.settings.max_tree_depth,
        });
    }

    match data {
        Value::Object(entries) => walk_object(entries, operation, config, field_path, depth),
        Value::Array(items) => walk_array(items, operation, config, field_path, depth),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(data.clone()),
    }
}

fn walk_object(
    entries: &Map<String, Value>,
    operation: Operation,
    config: &TransformConfig,
    field_path: &str,
    depth: usize,
) -> Result<Value, TransformError> {
    let mut rebuilt = Map::with_capacity(entries.len());

    for (key, value) in entries {
        let child_path = path::child(field_path, key);

        // The exclude list wins over everything else; excluded
        // subtrees are copied through without recursion.
        if config.is_excluded(key, &child_path) {
            rebuilt.insert(key.clone(), value.clone());
            continue;
        }

        let transformed =
            if matcher::should_transform(key, value, &child_path, operation, config) {
                apply_matched(value, operation, config, &child_path, depth)?
            } else if value.is_object() || value.is_array() {
                walk(value, operation, config, &child_path, depth + 1)?
            } else {
                value.clone()
            };

        rebuilt.insert(key.clone(), transformed);
    }

    Ok(Value::Object(rebuilt))
}

/// Arrays of strings are transformed per entry rather than re-wrapped;
/// other elements recurse as nodes.
fn walk_array(
    items: &[Value],
    operation: Operation,
    config: &TransformConfig,
    field_path: &str,
    depth: usize,
) -> Result<Value, TransformError> {
    let mut rebuilt = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        if item.is_string() {
            rebuilt.push(apply_codec(item, operation));
        } else {
            let item_path = path::indexed(field_path, index);
            rebuilt.push(walk(item, operation, config, &item_path, depth + 1)?);
        }
    }

    Ok(Value::Array(rebuilt))
}

/// A matched field: strings go straight through the codec, arrays are
/// transformed element-wise, anything else is kept as-is.
fn apply_matched(
    value: &Value,
    operation: Operation,
    config: &TransformConfig,
    field_path: &str,
    depth: usize,
) -> Result<Value, TransformError> {
    match value {
        Value::String(_) => Ok(apply_codec(value, operation)),
        Value::Array(items) => walk_array(items, operation, config, field_path, depth),
        _ => Ok(value.clone()),
    }
}

fn apply_codec(value: &Value, operation: Operation) -> Value {
    match operation {
        Operation::Encode => codec::encode_value(value),
        Operation::Decode => codec::decode_value(value),
    }
}
