//! Validation of tool arguments before they reach Home Assistant.
//!
//! Arguments come from an LLM or from parsed user text, so nothing is
//! trusted: keys are allow-listed, strings are flattened to a single line,
//! and nested collections are bounded.

use crate::error::SanitizationError;
use serde_json::{Map, Value};

/// Maximum number of items kept from any array or object.
pub const MAX_COLLECTION_ITEMS: usize = 20;

/// Returns the allow-listed, sanitized subset of `args`.
///
/// Keys outside `allowed_keys` and keys starting with `__` are dropped
/// silently; unsafe nested values are rejected.
pub fn sanitize_tool_arguments(
    args: Option<&Map<String, Value>>,
    allowed_keys: &[&str],
) -> Result<Map<String, Value>, SanitizationError> {
    if allowed_keys.is_empty() {
        return Err(SanitizationError::NoAllowedKeys);
    }
    let Some(args) = args else {
        return Ok(Map::new());
    };

    let mut sanitized = Map::new();
    for (key, value) in args {
        if !allowed_keys.contains(&key.as_str()) || key.starts_with("__") {
            continue;
        }
        sanitized.insert(key.clone(), sanitize_value(value)?);
    }
    Ok(sanitized)
}

fn sanitize_value(value: &Value) -> Result<Value, SanitizationError> {
    match value {
        Value::String(s) => Ok(Value::String(s.trim().replace(['\n', '\r'], " "))),
        Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
        Value::Array(items) => items
            .iter()
            .take(MAX_COLLECTION_ITEMS)
            .map(sanitize_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut sanitized = Map::new();
            for (key, item) in map.iter().take(MAX_COLLECTION_ITEMS) {
                if key.starts_with("__") {
                    return Err(SanitizationError::UnsafeKey);
                }
                sanitized.insert(key.clone(), sanitize_value(item)?);
            }
            Ok(Value::Object(sanitized))
        }
        Value::Null => Err(SanitizationError::UnsupportedType),
    }
}
