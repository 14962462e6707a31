//! Reference adapters shipped with the harness.
//!
//! These exist so the binary works out of the box and so the engine has
//! something deterministic to run against in tests. They are deliberately
//! small; real validator integrations live outside this crate.

use crate::adapter::{ValidatorAdapter, Verdict};
use crate::value::{strict_eq, type_name};
use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;

pub const ACCEPT_ALL: &str = "accept-all";
pub const TYPECHECK: &str = "typecheck";

/// Accepts every data instance regardless of schema. The fuzz engine's
/// default target.
#[derive(Debug)]
pub struct AcceptAll {
    directory: PathBuf,
}

impl AcceptAll {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl ValidatorAdapter for AcceptAll {
    fn name(&self) -> String {
        ACCEPT_ALL.to_string()
    }

    fn test_directory(&self) -> PathBuf {
        self.directory.clone()
    }

    fn validate(&self, _data: &Value, _schema: &Value) -> Result<Verdict> {
        Ok(Verdict::valid())
    }
}

/// A minimal schema interpreter covering boolean schemas, `type` and `enum`.
/// It exists to exercise both verdicts and error reporting, not to implement
/// a schema language.
#[derive(Debug)]
pub struct TypeCheck {
    directory: PathBuf,
}

impl TypeCheck {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn check_type(data: &Value, expected: &str) -> bool {
        match expected {
            // "number" accepts both numeric representations.
            "number" => matches!(data, Value::Number(_)),
            _ => type_name(data) == expected,
        }
    }
}

impl ValidatorAdapter for TypeCheck {
    fn name(&self) -> String {
        TYPECHECK.to_string()
    }

    fn test_directory(&self) -> PathBuf {
        self.directory.clone()
    }

    fn validate(&self, data: &Value, schema: &Value) -> Result<Verdict> {
        let mut errors = Vec::new();

        match schema {
            Value::Bool(true) => {}
            Value::Bool(false) => errors.push("schema rejects all values".to_string()),
            Value::Object(fields) => {
                match fields.get("type") {
                    Some(Value::String(expected)) => {
                        if !Self::check_type(data, expected) {
                            errors.push(format!("expected type '{expected}', found '{}'", type_name(data)));
                        }
                    }
                    Some(Value::Array(options)) => {
                        let matched = options
                            .iter()
                            .filter_map(Value::as_str)
                            .any(|expected| Self::check_type(data, expected));
                        if !matched {
                            errors.push(format!("value type '{}' not in the allowed set", type_name(data)));
                        }
                    }
                    _ => {}
                }

                if let Some(Value::Array(options)) = fields.get("enum")
                    && !options.iter().any(|option| strict_eq(option, data))
                {
                    errors.push("value is not one of the enumerated options".to_string());
                }
            }
            // Anything else is opaque to this validator and accepted.
            _ => {}
        }

        if errors.is_empty() {
            Ok(Verdict::valid())
        } else {
            Ok(Verdict::invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typecheck() -> TypeCheck {
        TypeCheck::new(PathBuf::from("tests"))
    }

    #[test]
    fn accept_all_accepts_everything() {
        let adapter = AcceptAll::new(PathBuf::from("tests"));
        assert!(adapter.validate(&json!(null), &json!(false)).unwrap().is_valid());
    }

    #[test]
    fn boolean_schemas() {
        let adapter = typecheck();
        assert!(adapter.validate(&json!(1), &json!(true)).unwrap().is_valid());

        let verdict = adapter.validate(&json!(1), &json!(false)).unwrap();
        assert!(!verdict.is_valid());
        assert_eq!(verdict.errors(), ["schema rejects all values"]);
    }

    #[test]
    fn type_keyword() {
        let adapter = typecheck();
        assert!(adapter.validate(&json!("x"), &json!({"type": "string"})).unwrap().is_valid());
        assert!(!adapter.validate(&json!(1), &json!({"type": "string"})).unwrap().is_valid());
        assert!(adapter.validate(&json!(1.5), &json!({"type": "number"})).unwrap().is_valid());
        assert!(adapter.validate(&json!(2), &json!({"type": "number"})).unwrap().is_valid());
        assert!(!adapter.validate(&json!(1.5), &json!({"type": "integer"})).unwrap().is_valid());
    }

    #[test]
    fn type_union() {
        let adapter = typecheck();
        let schema = json!({"type": ["string", "null"]});
        assert!(adapter.validate(&json!(null), &schema).unwrap().is_valid());
        assert!(!adapter.validate(&json!(3), &schema).unwrap().is_valid());
    }

    #[test]
    fn enum_keyword_uses_strict_equality() {
        let adapter = typecheck();
        let schema = json!({"enum": [1, "two"]});
        assert!(adapter.validate(&json!("two"), &schema).unwrap().is_valid());
        assert!(!adapter.validate(&json!(1.0), &schema).unwrap().is_valid());
    }

    #[test]
    fn non_schema_values_are_accepted_opaquely() {
        let adapter = typecheck();
        assert!(adapter.validate(&json!(1), &json!("not a schema")).unwrap().is_valid());
        assert!(adapter.validate(&json!(1), &json!(null)).unwrap().is_valid());
    }
}
