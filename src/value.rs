//! Helpers for type-dependent logic over heterogeneous JSON values.
//!
//! The harness treats test data as opaque `serde_json::Value`s, but several
//! components need to branch on the value's type: assertion messages, fuzz
//! case descriptions, and the diff formatter. Keeping that logic here makes
//! the type dispatch exhaustive in one place. Integers and floats count as
//! distinct types throughout.

use serde_json::Value;

/// The type label for a JSON value as used in diff output and fuzz
/// descriptions.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Type-and-value identity. `1` and `1.0` are not equal, `1` and `true` are
/// not equal. For arrays and objects this is deep equality with the same
/// integer/float distinction applied element-wise.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    // serde_json keeps integers and floats in separate `Number` variants, so
    // its `PartialEq` already has the identity semantics we need.
    type_name(a) == type_name(b) && a == b
}

/// Truthiness as used when canonicalizing verdicts for assertion messages.
/// `false`, `null`, `0`, `0.0`, `""`, `[]` and `{}` are falsy, everything
/// else is truthy. Note that empty composite containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().is_some_and(|f| f != 0.0)
            }
        }
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

/// Map a value to the verdict label used in assertion failure messages.
pub fn verdict_label(value: &Value) -> &'static str {
    if is_truthy(value) { "valid" } else { "invalid" }
}

/// A single-line rendering of a scalar value. Strings come out quoted,
/// composites come out as compact JSON.
pub fn scalar_repr(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_names_distinguish_integers_and_floats() {
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(-1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!(0.0)), "float");
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!("x")), "string");
        assert_eq!(type_name(&json!([1])), "array");
        assert_eq!(type_name(&json!({"a": 1})), "object");
    }

    #[test]
    fn strict_eq_is_type_sensitive() {
        assert!(strict_eq(&json!(1), &json!(1)));
        assert!(!strict_eq(&json!(1), &json!(1.0)));
        assert!(!strict_eq(&json!(0), &json!(false)));
        assert!(!strict_eq(&json!(null), &json!(false)));
        assert!(strict_eq(&json!([1, "a"]), &json!([1, "a"])));
        assert!(!strict_eq(&json!([1]), &json!([1.0])));
    }

    #[test]
    fn truthiness_table() {
        for falsy in [
            json!(false),
            json!(null),
            json!(0),
            json!(0.0),
            json!(""),
            json!([]),
            json!({}),
        ] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }

        for truthy in [json!(true), json!(1), json!(-0.5), json!(" "), json!([0]), json!({"a": null})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn verdict_labels() {
        assert_eq!(verdict_label(&json!(true)), "valid");
        assert_eq!(verdict_label(&json!(false)), "invalid");
        assert_eq!(verdict_label(&json!([])), "invalid");
    }

    #[test]
    fn scalar_repr_quotes_strings() {
        assert_eq!(scalar_repr(&json!("hi")), "\"hi\"");
        assert_eq!(scalar_repr(&json!(3)), "3");
        assert_eq!(scalar_repr(&json!(true)), "true");
    }
}
