//! Statistical summary of suite composition and pass rates.

use crate::suite::TestSuite;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Aggregate counts and distributions over one or more suites.
#[derive(Debug, Serialize)]
pub struct CoverageReport {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Percentage of passing tests, `0` for an empty corpus.
    pub pass_rate: f64,
    /// Count per group description, descending. Ties keep insertion order.
    pub group_distribution: Vec<(String, usize)>,
    pub file_distribution: Vec<(String, usize)>,
    pub tag_distribution: Vec<(String, usize)>,
    /// Composite score in `[0, 100]` weighing pass rate against corpus
    /// breadth.
    pub coverage_score: f64,
}

impl CoverageReport {
    pub fn distinct_groups(&self) -> usize {
        self.group_distribution.len()
    }

    pub fn distinct_files(&self) -> usize {
        self.file_distribution.len()
    }

    pub fn distinct_tags(&self) -> usize {
        self.tag_distribution.len()
    }
}

/// A counter that remembers first-seen order so that equal counts sort
/// stably.
#[derive(Default)]
struct Distribution {
    order: Vec<String>,
    counts: FxHashMap<String, usize>,
}

impl Distribution {
    fn record(&mut self, key: &str) {
        match self.counts.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.order.push(key.to_string());
                self.counts.insert(key.to_string(), 1);
            }
        }
    }

    fn into_sorted(self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .order
            .into_iter()
            .map(|key| {
                let count = self.counts[&key];
                (key, count)
            })
            .collect();

        // Stable sort keeps insertion order among equal counts.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

pub fn analyze(suites: &[TestSuite]) -> CoverageReport {
    let mut total = 0;
    let mut passed = 0;
    let mut groups = Distribution::default();
    let mut files = Distribution::default();
    let mut tags = Distribution::default();

    for suite in suites {
        for result in &suite.results {
            total += 1;
            if result.passed {
                passed += 1;
            }

            groups.record(&result.group);
            files.record(&result.file.to_string_lossy());
            for tag in &result.tags {
                tags.record(tag);
            }
        }
    }

    let group_distribution = groups.into_sorted();
    let file_distribution = files.into_sorted();
    let tag_distribution = tags.into_sorted();

    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    };

    let coverage_score = if total == 0 {
        0.0
    } else {
        let pass_component = 0.6 * (passed as f64 / total as f64);
        let group_component = 0.2 * (group_distribution.len() as f64 / 10.0).min(1.0);
        let file_component = 0.2 * (file_distribution.len() as f64 / 10.0).min(1.0);
        (100.0 * (pass_component + group_component + file_component)).min(100.0)
    };

    CoverageReport {
        total_tests: total,
        passed_tests: passed,
        failed_tests: total - passed,
        pass_rate,
        group_distribution,
        file_distribution,
        tag_distribution,
        coverage_score,
    }
}
