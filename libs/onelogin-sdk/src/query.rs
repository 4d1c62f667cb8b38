//! Query-string serialization.
//!
//! Query objects are serialized through `serde_json` first, so any
//! `Serialize` type works. Keys are converted to `snake_case`, empty values
//! are dropped and arrays become comma-separated lists.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static FIRST_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("static regex should not panic"));
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static ALL_CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").expect("static regex should not panic"));
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("static regex should not panic"));

/// `UserIDs` → `user_ids`, `createdSince` → `created_since`.
#[must_use]
pub fn to_snake_case(input: &str) -> String {
    let snake = FIRST_CAP.replace_all(input, "${1}_${2}");
    let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");
    let snake = WHITESPACE.replace_all(&snake, "_");
    snake.to_lowercase().replace("i_ds", "ids")
}

/// Flatten a query object into `(key, value)` pairs.
///
/// # Errors
///
/// [`ApiError::Construction`] when the query is not an object, or holds a
/// nested object or an array of non-scalars.
pub fn serialize_query<Q: Serialize + ?Sized>(
    query: &Q,
) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(query)
        .map_err(|e| ApiError::Construction(format!("unable to serialize query: {e}")))?;

    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(ApiError::Construction(format!(
                "query must be an object, got {}",
                type_name(&other)
            )));
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        if let Some(rendered) = render_value(&key, value)? {
            pairs.push((to_snake_case(&key), rendered));
        }
    }
    Ok(pairs)
}

fn render_value(key: &str, value: Value) -> Result<Option<String>, ApiError> {
    match value {
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(part) = render_scalar(key, item)? {
                    parts.push(part);
                }
            }
            if parts.is_empty() {
                Ok(None)
            } else {
                Ok(Some(parts.join(",")))
            }
        }
        other => render_scalar(key, other),
    }
}

fn render_scalar(key: &str, value: Value) -> Result<Option<String>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(ApiError::Construction(format!(
            "query parameter '{key}' must be a scalar or a list of scalars, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
