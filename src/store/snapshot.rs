//! Verdict snapshots for regression diffing.

use crate::store::{load_json, unix_now};
use crate::suite::TestSuite;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_SNAPSHOT_DIR: &str = ".prism/snapshots";

/// The persisted verdict of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub passed: bool,
    pub expected: bool,
    pub actual: bool,
}

/// The persisted summary of one suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub pass_rate: f64,
    pub results: BTreeMap<String, CaseVerdict>,
    #[serde(default)]
    pub created_at: i64,
}

impl SnapshotRecord {
    pub fn from_suite(suite: &TestSuite) -> Self {
        let total = suite.total();
        let passed = suite.passed();

        Self {
            total_tests: total,
            passed_tests: passed,
            failed_tests: total - passed,
            pass_rate: if total == 0 {
                0.0
            } else {
                passed as f64 / total as f64 * 100.0
            },
            results: suite
                .results
                .iter()
                .map(|result| {
                    (
                        result.id.clone(),
                        CaseVerdict {
                            passed: result.passed,
                            expected: result.expected,
                            actual: result.actual,
                        },
                    )
                })
                .collect(),
            created_at: unix_now(),
        }
    }

    /// Case ids whose pass/fail verdict differs between this record and
    /// `current`, restricted to cases present in both.
    pub fn verdict_changes(&self, current: &SnapshotRecord) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(id, previous)| {
                current
                    .results
                    .get(id)
                    .filter(|latest| latest.passed != previous.passed)
                    .map(|_| id.clone())
            })
            .collect()
    }
}

pub struct SnapshotStore {
    directory: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::at(PathBuf::from(DEFAULT_SNAPSHOT_DIR))
    }
}

impl SnapshotStore {
    pub fn at(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn path_for(&self, suite_name: &str) -> PathBuf {
        self.directory.join(format!("{suite_name}.json"))
    }

    /// Persist the suite's verdicts, returning the file path.
    pub fn save(&self, suite: &TestSuite) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)
            .with_context(|| format!("Could not create the snapshot directory '{}'", self.directory.display()))?;

        let mut document = BTreeMap::new();
        document.insert(suite.name.clone(), SnapshotRecord::from_suite(suite));

        let path = self.path_for(&suite.name);
        std::fs::write(&path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("Could not write the snapshot to '{}'", path.display()))?;

        Ok(path)
    }

    /// Load a previously saved snapshot document, or `None` when there is no
    /// usable one.
    pub fn load(&self, suite_name: &str) -> Option<BTreeMap<String, SnapshotRecord>> {
        load_json(&self.path_for(suite_name))
    }

    /// The record for one suite, if present.
    pub fn load_record(&self, suite_name: &str) -> Option<SnapshotRecord> {
        self.load(suite_name)?.remove(suite_name)
    }
}
