//! Timing baselines for performance diffing.

use crate::store::{load_json, unix_now};
use crate::suite::TestSuite;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_BASELINE_DIR: &str = ".prism/baselines";
pub const DEFAULT_BASELINE_NAME: &str = "default";

/// The persisted timings of one suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub total_duration: f64,
    pub total_tests: usize,
    /// Case id to seconds spent on that case.
    pub test_timings: BTreeMap<String, f64>,
    #[serde(default)]
    pub created_at: i64,
}

impl BaselineRecord {
    pub fn from_suite(suite: &TestSuite) -> Self {
        Self {
            total_duration: suite.duration,
            total_tests: suite.total(),
            test_timings: suite
                .results
                .iter()
                .map(|result| (result.id.clone(), result.duration))
                .collect(),
            created_at: unix_now(),
        }
    }
}

pub struct BaselineStore {
    directory: PathBuf,
}

impl Default for BaselineStore {
    fn default() -> Self {
        Self::at(PathBuf::from(DEFAULT_BASELINE_DIR))
    }
}

impl BaselineStore {
    pub fn at(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.json"))
    }

    /// Persist the suites' timings under the given baseline name.
    pub fn save(&self, name: &str, suites: &[TestSuite]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)
            .with_context(|| format!("Could not create the baseline directory '{}'", self.directory.display()))?;

        let document: BTreeMap<String, BaselineRecord> = suites
            .iter()
            .map(|suite| (suite.name.clone(), BaselineRecord::from_suite(suite)))
            .collect();

        let path = self.path_for(name);
        std::fs::write(&path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("Could not write the baseline to '{}'", path.display()))?;

        Ok(path)
    }

    /// Load a named baseline, or `None` when there is no usable one.
    pub fn load(&self, name: &str) -> Option<BTreeMap<String, BaselineRecord>> {
        load_json(&self.path_for(name))
    }
}
