//! Result records produced by the runners.
//!
//! These types need to be serializable as JSON so batch workers can hand
//! their results back to the parent process through a file, and so suites
//! can be printed with `--json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// The invariant record of one executed case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Canonical form `<suite>:<fileStem>:<groupIndex>:<caseIndex>`. Unique
    /// within a suite and stable across runs for unchanged input.
    pub id: String,
    pub file: PathBuf,
    pub group: String,
    pub description: String,
    /// A snapshot of the case's input data.
    pub data: Value,
    pub expected: bool,
    pub actual: bool,
    /// Computed by the assertion strategy, not by comparing the two verdict
    /// fields directly.
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall clock seconds spent validating and asserting this case.
    pub duration: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TestResult {
    /// The case id without its suite name prefix. Used to align results from
    /// different validators over the same corpus.
    pub fn corpus_id(&self) -> &str {
        self.id.split_once(':').map_or(self.id.as_str(), |(_, rest)| rest)
    }
}

/// The ordered results of running one validator across a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    pub results: Vec<TestResult>,
    /// Total wall clock seconds for the run.
    pub duration: f64,
}

impl TestSuite {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// A copy of the suite containing only failed results.
    pub fn only_failed(&self) -> TestSuite {
        TestSuite {
            name: self.name.clone(),
            results: self.results.iter().filter(|result| !result.passed).cloned().collect(),
            duration: self.duration,
        }
    }
}
