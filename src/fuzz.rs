//! Driving a validator with synthesized inputs.
//!
//! Every fuzz run starts with a fixed table of 24 edge cases (boundary
//! numbers, whitespace strings, pathological nesting) followed by a
//! configurable number of pseudo-random inputs. The schema is the trivially
//! permissive `true`, so a correct validator accepts everything; a rejection
//! or a crash is a finding. The generator is seeded, so runs are
//! reproducible by default.

use crate::adapter::ValidatorAdapter;
use crate::debug::panic_message;
use crate::suite::{TestResult, TestSuite};
use rand::Rng;
use rand::SeedableRng;
use rand::seq::IteratorRandom;
use rand_pcg::Pcg32;
use serde_json::{Value, json};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::time::Instant;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Create the pseudo-random generator with its fixed default seed.
pub fn new_prng() -> Pcg32 {
    Pcg32::new(0x5eed_cafe, 87)
}

/// The value kinds the random generator draws from, uniformly. Objects are
/// deliberately absent; the edge-case table covers them.
#[derive(Debug, Clone, Copy, EnumIter)]
enum FuzzKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Array,
}

pub struct FuzzEngine {
    iterations: usize,
    prng: Pcg32,
}

impl FuzzEngine {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            prng: new_prng(),
        }
    }

    /// Override the default fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.prng = Pcg32::seed_from_u64(seed);
        self
    }

    /// Run the edge cases and the random cases against the adapter. The
    /// resulting suite is named `<adapter> (fuzzed)`.
    pub fn run(mut self, adapter: &dyn ValidatorAdapter) -> TestSuite {
        let start = Instant::now();
        let mut results = Vec::with_capacity(24 + self.iterations);

        for (index, data) in edge_cases().into_iter().enumerate() {
            let description = format!("Edge case: {}", describe(&data));
            results.push(run_fuzz_case(adapter, format!("edge-case-{index}"), description, data));
        }

        for index in 0..self.iterations {
            let data = random_value(&mut self.prng, 0);
            let description = format!("Fuzzed input: {}", describe(&data));
            results.push(run_fuzz_case(adapter, format!("fuzz-{index}"), description, data));
        }

        TestSuite {
            name: format!("{} (fuzzed)", adapter.name()),
            results,
            duration: start.elapsed().as_secs_f64(),
        }
    }
}

/// The fixed edge-case inputs, in a stable order.
pub fn edge_cases() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(false),
        json!(0),
        json!(-1),
        json!(1),
        json!(i64::MAX),
        json!(i64::MIN),
        json!(0.0),
        json!(-0.0),
        json!(""),
        json!(" "),
        json!("\n"),
        json!("\t"),
        json!("a"),
        Value::String("a".repeat(1_000)),
        Value::String("a".repeat(10_000)),
        json!([]),
        json!([null]),
        json!([""]),
        json!([0]),
        json!([[]]),
        json!({"key": "value"}),
        json!({"nested": {"deep": {"value": true}}}),
    ]
}

fn run_fuzz_case(adapter: &dyn ValidatorAdapter, id: String, description: String, data: Value) -> TestResult {
    let start = Instant::now();
    let verdict = catch_unwind(AssertUnwindSafe(|| adapter.validate(&data, &Value::Bool(true))));

    let (expected, actual, passed, error, tags) = match verdict {
        Ok(Ok(verdict)) => {
            let actual = verdict.is_valid();
            (true, actual, actual, None, vec!["fuzzed".to_string()])
        }
        Ok(Err(err)) => (
            false,
            false,
            false,
            Some(format!("{err:#}")),
            vec!["fuzzed".to_string(), "error".to_string()],
        ),
        Err(panic) => (
            false,
            false,
            false,
            Some(panic_message(&*panic)),
            vec!["fuzzed".to_string(), "error".to_string()],
        ),
    };

    TestResult {
        id,
        file: PathBuf::from("fuzzed"),
        group: "fuzzing".to_string(),
        description,
        data,
        expected,
        actual,
        passed,
        error,
        duration: start.elapsed().as_secs_f64(),
        tags,
    }
}

/// A type hint for fuzz case descriptions. Floats and objects intentionally
/// read as "unknown".
fn describe(data: &Value) -> String {
    match data {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if !n.is_f64() => "integer".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) if items.is_empty() => "empty array".to_string(),
        Value::Array(items) => format!("array of {} elements", items.len()),
        Value::Number(_) | Value::Object(_) => "unknown".to_string(),
    }
}

/// Draw one random value. Array elements recurse with a depth bound so
/// structures stay small.
fn random_value(prng: &mut Pcg32, depth: u32) -> Value {
    let kind = FuzzKind::iter().choose(prng).unwrap_or(FuzzKind::Null);

    match kind {
        FuzzKind::Null => Value::Null,
        FuzzKind::Boolean => Value::Bool(prng.random_bool(0.5)),
        FuzzKind::Integer => json!(prng.random_range(-1_000_000..=1_000_000i64)),
        FuzzKind::Float => json!(prng.random_range(-1.0e6..=1.0e6)),
        FuzzKind::String => {
            let length = prng.random_range(0..=100);
            Value::String((0..length).map(|_| prng.random_range(b' '..=b'~') as char).collect())
        }
        FuzzKind::Array => {
            if depth >= 2 {
                return Value::Array(Vec::new());
            }

            let length = prng.random_range(0..=10);
            Value::Array((0..length).map(|_| random_value(prng, depth + 1)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Verdict;
    use anyhow::Result;

    #[derive(Debug)]
    struct Permissive;

    impl ValidatorAdapter for Permissive {
        fn name(&self) -> String {
            "permissive".to_string()
        }

        fn test_directory(&self) -> PathBuf {
            PathBuf::from("unused")
        }

        fn validate(&self, _data: &Value, _schema: &Value) -> Result<Verdict> {
            Ok(Verdict::valid())
        }
    }

    #[derive(Debug)]
    struct Brittle;

    impl ValidatorAdapter for Brittle {
        fn name(&self) -> String {
            "brittle".to_string()
        }

        fn test_directory(&self) -> PathBuf {
            PathBuf::from("unused")
        }

        fn validate(&self, data: &Value, _schema: &Value) -> Result<Verdict> {
            match data {
                Value::Null => anyhow::bail!("cannot handle null"),
                Value::Array(_) => Ok(Verdict::invalid(vec!["arrays rejected".to_string()])),
                _ => Ok(Verdict::valid()),
            }
        }
    }

    #[test]
    fn zero_iterations_yields_exactly_the_edge_cases() {
        let suite = FuzzEngine::new(0).run(&Permissive);

        assert_eq!(suite.name, "permissive (fuzzed)");
        assert_eq!(suite.total(), 24);
        for (index, result) in suite.results.iter().enumerate() {
            assert_eq!(result.id, format!("edge-case-{index}"));
            assert_eq!(result.group, "fuzzing");
            assert_eq!(result.file, PathBuf::from("fuzzed"));
            assert_eq!(result.tags, vec!["fuzzed".to_string()]);
            assert!(result.passed);
        }
    }

    #[test]
    fn random_cases_are_appended_with_their_own_ids() {
        let suite = FuzzEngine::new(5).run(&Permissive);

        assert_eq!(suite.total(), 29);
        for (index, result) in suite.results.iter().skip(24).enumerate() {
            assert_eq!(result.id, format!("fuzz-{index}"));
            assert!(result.description.starts_with("Fuzzed input: "));
        }
    }

    #[test]
    fn identical_seeds_generate_identical_inputs() {
        let first = FuzzEngine::new(20).with_seed(7).run(&Permissive);
        let second = FuzzEngine::new(20).with_seed(7).run(&Permissive);

        for (a, b) in first.results.iter().zip(&second.results) {
            assert_eq!(a.data, b.data);
            assert_eq!(a.description, b.description);
        }
    }

    #[test]
    fn rejections_fail_and_errors_are_tagged() {
        let suite = FuzzEngine::new(0).run(&Brittle);

        // Edge case 0 is null, which makes this validator error out.
        let errored = &suite.results[0];
        assert!(!errored.passed);
        assert!(!errored.expected);
        assert!(!errored.actual);
        assert_eq!(errored.error.as_deref(), Some("cannot handle null"));
        assert_eq!(errored.tags, vec!["fuzzed".to_string(), "error".to_string()]);

        // Edge case 17 is the empty array, rejected but not errored.
        let rejected = &suite.results[17];
        assert!(!rejected.passed);
        assert!(rejected.expected);
        assert!(!rejected.actual);
        assert!(rejected.error.is_none());
        assert_eq!(rejected.tags, vec!["fuzzed".to_string()]);
    }

    #[test]
    fn edge_case_table_is_stable() {
        let cases = edge_cases();
        assert_eq!(cases.len(), 24);
        assert_eq!(cases[0], Value::Null);
        assert_eq!(cases[6], json!(i64::MAX));
        assert_eq!(cases[7], json!(i64::MIN));
        assert_eq!(cases[15].as_str().unwrap().len(), 1_000);
        assert_eq!(cases[16].as_str().unwrap().len(), 10_000);
        assert_eq!(cases[21], json!([[]]));
        assert_eq!(cases[23], json!({"nested": {"deep": {"value": true}}}));
    }

    #[test]
    fn descriptions_hint_at_the_value_type() {
        assert_eq!(describe(&json!(null)), "null");
        assert_eq!(describe(&json!(true)), "boolean");
        assert_eq!(describe(&json!(3)), "integer");
        assert_eq!(describe(&json!("x")), "string");
        assert_eq!(describe(&json!([])), "empty array");
        assert_eq!(describe(&json!([1, 2, 3])), "array of 3 elements");
        // Floats and objects intentionally fall through.
        assert_eq!(describe(&json!(1.5)), "unknown");
        assert_eq!(describe(&json!({"a": 1})), "unknown");
    }

    #[test]
    fn random_values_respect_the_size_bounds() {
        let mut prng = new_prng();
        for _ in 0..500 {
            match random_value(&mut prng, 0) {
                Value::String(s) => assert!(s.len() <= 100),
                Value::Array(items) => assert!(items.len() <= 10),
                Value::Object(_) => panic!("the random pool does not contain objects"),
                _ => {}
            }
        }
    }
}
