//! Assertion strategies for comparing expected and observed verdicts.
//!
//! A test case normally passes when the validator's verdict matches the
//! expected one, but corpora can opt into different semantics per case by
//! naming a strategy. Strategies are resolved through a string-keyed
//! registry; an unknown or absent name falls back to strict equality, which
//! several corpora rely on.

use crate::value::{strict_eq, verdict_label};
use rustc_hash::FxHashMap;
use serde_json::Value;

/// A pluggable pass/fail policy for a single case.
pub trait AssertionStrategy: Send + Sync {
    /// The registry key for this strategy.
    fn name(&self) -> &'static str;

    /// Whether the observed verdict satisfies the expectation.
    fn evaluate(&self, data: &Value, expected: &Value, actual: &Value) -> bool;

    /// A human readable explanation for a failed evaluation.
    fn describe_failure(&self, data: &Value, expected: &Value, actual: &Value) -> String;
}

/// The outcome of running a strategy: `message` is present exactly when the
/// case failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOutcome {
    pub passed: bool,
    pub message: Option<String>,
}

/// Passes when expected and actual are identical in type and value.
pub struct StrictEquality;

impl AssertionStrategy for StrictEquality {
    fn name(&self) -> &'static str {
        "strict-equality"
    }

    fn evaluate(&self, _data: &Value, expected: &Value, actual: &Value) -> bool {
        strict_eq(expected, actual)
    }

    fn describe_failure(&self, _data: &Value, expected: &Value, actual: &Value) -> String {
        format!(
            "Expected data to be {}, but validator returned {}",
            verdict_label(expected),
            verdict_label(actual)
        )
    }
}

/// When the expectation is an array, passes if the verdict is identical to
/// any element. For non-array expectations this behaves like
/// [`StrictEquality`].
pub struct AnyOf;

impl AssertionStrategy for AnyOf {
    fn name(&self) -> &'static str {
        "any-of"
    }

    fn evaluate(&self, data: &Value, expected: &Value, actual: &Value) -> bool {
        match expected {
            Value::Array(options) => options.iter().any(|option| strict_eq(option, actual)),
            _ => StrictEquality.evaluate(data, expected, actual),
        }
    }

    fn describe_failure(&self, data: &Value, expected: &Value, actual: &Value) -> String {
        match expected {
            Value::Array(options) => {
                let listed = options.iter().map(verdict_label).collect::<Vec<_>>().join(", ");
                format!(
                    "Expected data to be one of [{listed}], but validator returned {}",
                    verdict_label(actual)
                )
            }
            _ => StrictEquality.describe_failure(data, expected, actual),
        }
    }
}

/// Maps strategy names to implementations.
pub struct AssertionRegistry {
    strategies: FxHashMap<&'static str, Box<dyn AssertionStrategy>>,
    fallback: StrictEquality,
}

impl Default for AssertionRegistry {
    fn default() -> Self {
        let mut registry = Self {
            strategies: FxHashMap::default(),
            fallback: StrictEquality,
        };

        registry.register(Box::new(StrictEquality));
        registry.register(Box::new(AnyOf));
        registry
    }
}

impl AssertionRegistry {
    pub fn register(&mut self, strategy: Box<dyn AssertionStrategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    /// Resolve a strategy by name, falling back to strict equality when the
    /// name is absent or unknown.
    pub fn resolve(&self, name: Option<&str>) -> &dyn AssertionStrategy {
        name.and_then(|name| self.strategies.get(name))
            .map(Box::as_ref)
            .unwrap_or(&self.fallback)
    }

    /// Run the named strategy over one case.
    pub fn execute(&self, name: Option<&str>, data: &Value, expected: &Value, actual: &Value) -> AssertionOutcome {
        let strategy = self.resolve(name);
        let passed = strategy.evaluate(data, expected, actual);

        AssertionOutcome {
            passed,
            message: (!passed).then(|| strategy.describe_failure(data, expected, actual)),
        }
    }

    /// The registered strategy names, sorted for stable listings.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.strategies.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
