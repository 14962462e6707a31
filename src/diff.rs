//! Differential comparison of validators.
//!
//! Runs every adapter over the shared corpus with the sequential engine,
//! aligns the results by their corpus-local case id, and reports the cases
//! where the verdicts are not unanimous. Useful for pitting a new validator
//! implementation against a reference one.

use crate::adapter::ValidatorAdapter;
use crate::filter::FilterPolicy;
use crate::runner::SequentialRunner;
use anyhow::Result;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// One adapter's view of one case.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub passed: bool,
    pub actual: bool,
    pub expected: bool,
}

/// A case where the adapters disagreed on the verdict.
#[derive(Debug, Serialize)]
pub struct Discrepancy {
    pub test_id: String,
    pub description: String,
    /// Adapter name to its observed outcome, in stable order.
    pub outcomes: BTreeMap<String, Outcome>,
    /// The share of adapters in the majority verdict, e.g. `"50.0%"`.
    pub agreement: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The number of case ids that could be aligned across adapters.
    pub total_cases: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl ComparisonReport {
    pub fn discrepancies_count(&self) -> usize {
        self.discrepancies.len()
    }

    fn error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            total_cases: 0,
            discrepancies: Vec::new(),
        }
    }
}

/// Run all adapters over the corpus and collect their disagreements.
///
/// Fewer than two adapters is reported through the `error` field rather
/// than as a hard failure.
pub fn compare(
    adapters: &BTreeMap<String, Box<dyn ValidatorAdapter>>,
    filter: Option<&FilterPolicy>,
) -> Result<ComparisonReport> {
    if adapters.len() < 2 {
        return Ok(ComparisonReport::error("At least two validators required for comparison"));
    }

    // Alignment key to (description, adapter outcomes), with the key
    // insertion order preserved so discrepancies follow corpus order.
    let mut order: Vec<String> = Vec::new();
    let mut aligned: FxHashMap<String, (String, BTreeMap<String, Outcome>)> = FxHashMap::default();

    for (name, adapter) in adapters {
        let mut runner = SequentialRunner::new(adapter.as_ref());
        if let Some(filter) = filter {
            runner = runner.with_filter(filter);
        }

        let suite = runner.run(None, None)?;
        for result in suite.results {
            let key = result.corpus_id().to_string();
            let entry = aligned.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (result.description.clone(), BTreeMap::new())
            });

            entry.1.insert(
                name.clone(),
                Outcome {
                    passed: result.passed,
                    actual: result.actual,
                    expected: result.expected,
                },
            );
        }
    }

    let mut discrepancies = Vec::new();
    for key in &order {
        let (description, outcomes) = &aligned[key];

        let valid_count = outcomes.values().filter(|outcome| outcome.actual).count();
        let invalid_count = outcomes.len() - valid_count;
        if valid_count == 0 || invalid_count == 0 {
            continue;
        }

        let majority = valid_count.max(invalid_count);
        let percentage = majority as f64 / outcomes.len() as f64 * 100.0;

        discrepancies.push(Discrepancy {
            test_id: key.clone(),
            description: description.clone(),
            outcomes: outcomes.clone(),
            agreement: format!("{:.1}%", (percentage * 10.0).round() / 10.0),
        });
    }

    Ok(ComparisonReport {
        error: None,
        total_cases: order.len(),
        discrepancies,
    })
}
