//! Wire value domain.
//!
//! Wire values are JSON values: null, booleans, numbers, strings, sequences and
//! string-keyed mappings. The parameter bag handed to the router is a flat
//! mapping of such values.

pub use serde_json::{Map, Number, Value};

/// Flat, unordered set of non-path request inputs (query string and body).
pub type Parameters = Map<String, Value>;

/// Short name of a wire value's shape, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Render a wire value the way it appears in error messages.
///
/// Strings are shown without quotes, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Textual form of a scalar, as matched by the type patterns.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
