//! Human readable descriptions of the divergence between two JSON values.

use crate::value::{scalar_repr, strict_eq, type_name};
use serde_json::Value;

/// Describe how `actual` diverges from `expected`.
///
/// Produces one of four shapes: identical values, a type mismatch, a scalar
/// value mismatch, or a structural mismatch with both sides pretty-printed.
pub fn diff(expected: &Value, actual: &Value) -> String {
    if strict_eq(expected, actual) {
        return "Values are identical".to_string();
    }

    let expected_type = type_name(expected);
    let actual_type = type_name(actual);

    if expected_type != actual_type {
        return format!(
            "Type mismatch:\n  Expected: {expected_type} ({})\n  Actual:   {actual_type} ({})",
            scalar_repr(expected),
            scalar_repr(actual)
        );
    }

    match expected {
        Value::Array(_) | Value::Object(_) => format!(
            "Data structure mismatch:\n  Expected:\n{}\n  Actual:\n{}",
            pretty(expected),
            pretty(actual)
        ),
        _ => format!(
            "Value mismatch ({expected_type}):\n  Expected: {}\n  Actual:   {}",
            scalar_repr(expected),
            scalar_repr(actual)
        ),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
