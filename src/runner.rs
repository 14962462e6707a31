//! The sequential execution engine.
//!
//! Walks a corpus, drives the validator adapter over every surviving case
//! and folds the outcomes into a [`TestSuite`]. All other execution modes
//! (parallel, incremental, watch, comparison) are layered on top of this
//! loop; batch workers run exactly this code over a file subset.

use crate::adapter::ValidatorAdapter;
use crate::assertions::AssertionRegistry;
use crate::cli::progress::ProgressReporter;
use crate::corpus;
use crate::debug::panic_message;
use crate::filter::FilterPolicy;
use crate::suite::{TestResult, TestSuite};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

pub mod parallel;

pub struct SequentialRunner<'a> {
    adapter: &'a dyn ValidatorAdapter,
    filter: Option<&'a FilterPolicy>,
    assertions: AssertionRegistry,
}

impl<'a> SequentialRunner<'a> {
    pub fn new(adapter: &'a dyn ValidatorAdapter) -> Self {
        Self {
            adapter,
            filter: None,
            assertions: AssertionRegistry::default(),
        }
    }

    pub fn with_filter(mut self, filter: &'a FilterPolicy) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_assertions(mut self, assertions: AssertionRegistry) -> Self {
        self.assertions = assertions;
        self
    }

    fn file_patterns(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in self.adapter.file_patterns() {
            builder.add(Glob::new(&pattern).with_context(|| format!("Could not parse the file pattern '{pattern}'"))?);
        }

        builder.build().context("Could not compile the adapter's file patterns")
    }

    fn includes_file(&self, patterns: &GlobSet, path: &Path) -> bool {
        let name_matches = path.file_name().is_some_and(|name| patterns.is_match(name));

        name_matches
            && self.adapter.should_include_file(path)
            && self.filter.is_none_or(|filter| filter.should_include_file(path))
    }

    /// Recursively scan the adapter's corpus directory for test files,
    /// sorted lexicographically. A missing corpus directory yields an empty
    /// list rather than an error.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let patterns = self.file_patterns()?;
        let mut files: Vec<PathBuf> = WalkDir::new(self.adapter.test_directory())
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!("skipping unreadable corpus entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.includes_file(&patterns, path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// The number of well-formed cases in the given files, applying the
    /// file-level filters but not invoking the validator. Used to size
    /// progress bars before any work begins.
    pub fn count_cases(&self, files: &[PathBuf]) -> usize {
        let Ok(patterns) = self.file_patterns() else {
            return 0;
        };

        files
            .iter()
            .filter(|path| self.includes_file(&patterns, path))
            .map(|path| corpus::count_cases(path, |content| self.adapter.decode(content)))
            .sum()
    }

    /// Execute the suite. When `files` is absent the corpus directory is
    /// scanned; an explicit list is sorted and passed through the same
    /// file-level filters as a scan.
    pub fn run(&self, files: Option<Vec<PathBuf>>, mut progress: Option<&mut ProgressReporter>) -> Result<TestSuite> {
        let patterns = self.file_patterns()?;
        let files = match files {
            Some(mut files) => {
                files.sort();
                files.retain(|path| self.includes_file(&patterns, path));
                files
            }
            None => self.discover_files()?,
        };

        let name = self.adapter.name();
        let start = Instant::now();
        let mut results = Vec::new();

        for file in &files {
            let mut file_results = self.run_file(&name, file);

            if let Some(filter) = self.filter {
                file_results.retain(|result| filter.should_include_case(result));
            }

            if let Some(progress) = progress.as_deref_mut() {
                for result in &file_results {
                    progress.advance(result);
                }
            }

            results.extend(file_results);
        }

        Ok(TestSuite {
            name,
            results,
            duration: start.elapsed().as_secs_f64(),
        })
    }

    /// All results for one file, in declaration order, before case-level
    /// filtering.
    fn run_file(&self, suite_name: &str, file: &Path) -> Vec<TestResult> {
        let stem = file.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();

        let groups = corpus::load_groups(file, |content| self.adapter.decode(content));
        let mut results = Vec::new();

        for group in &groups {
            for (case_index, case) in &group.cases {
                let id = format!("{suite_name}:{stem}:{}:{case_index}", group.index);
                results.push(self.run_case(id, file, group.description.clone(), &group.schema, case));
            }
        }

        results
    }

    fn run_case(
        &self,
        id: String,
        file: &Path,
        group: String,
        schema: &Value,
        case: &corpus::TestCase,
    ) -> TestResult {
        let start = Instant::now();

        // A panicking validator must not take the run down with it; the
        // panic becomes a failed result like any other validator error.
        let verdict = catch_unwind(AssertUnwindSafe(|| self.adapter.validate(&case.data, schema)));

        let (passed, actual, error) = match verdict {
            Ok(Ok(verdict)) => {
                let actual = verdict.is_valid();
                let outcome = self.assertions.execute(
                    case.assertion.as_deref(),
                    &case.data,
                    &Value::Bool(case.expected_valid),
                    &Value::Bool(actual),
                );

                (outcome.passed, actual, outcome.message)
            }
            Ok(Err(err)) => (false, false, Some(format!("{err:#}"))),
            Err(panic) => (false, false, Some(panic_message(&*panic))),
        };

        TestResult {
            id,
            file: file.to_path_buf(),
            group,
            description: case.description.clone(),
            data: case.data.clone(),
            expected: case.expected_valid,
            actual,
            passed,
            error,
            duration: start.elapsed().as_secs_f64(),
            tags: case.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Verdict;
    use crate::filter::FilterConfig;
    use anyhow::bail;
    use serde_json::json;
    use std::fs;

    /// A scriptable adapter for exercising the engine.
    #[derive(Debug)]
    struct ScriptedAdapter {
        directory: PathBuf,
        mode: Mode,
    }

    #[derive(Debug)]
    enum Mode {
        AlwaysValid,
        AlwaysInvalid,
        Error(String),
        Panic,
    }

    impl ValidatorAdapter for ScriptedAdapter {
        fn name(&self) -> String {
            "TestSuite".to_string()
        }

        fn test_directory(&self) -> PathBuf {
            self.directory.clone()
        }

        fn validate(&self, _data: &Value, _schema: &Value) -> Result<Verdict> {
            match &self.mode {
                Mode::AlwaysValid => Ok(Verdict::valid()),
                Mode::AlwaysInvalid => Ok(Verdict::invalid(vec!["rejected".to_string()])),
                Mode::Error(message) => bail!("{message}"),
                Mode::Panic => panic!("validator exploded"),
            }
        }
    }

    fn corpus_dir(files: &[(&str, Value)]) -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        for (name, value) in files {
            fs::write(dir.path().join(name), serde_json::to_string(value).unwrap()).unwrap();
        }
        dir
    }

    fn single_case_corpus() -> tempfile::TempDir {
        corpus_dir(&[(
            "test.json",
            json!([
                {
                    "description": "strings",
                    "schema": {"type": "string"},
                    "tests": [{"description": "hello", "data": "hello", "valid": true}]
                }
            ]),
        )])
    }

    fn adapter(dir: &tempfile::TempDir, mode: Mode) -> ScriptedAdapter {
        ScriptedAdapter {
            directory: dir.path().to_path_buf(),
            mode,
        }
    }

    #[test]
    fn passing_case_produces_canonical_result() {
        let dir = single_case_corpus();
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        assert_eq!(suite.total(), 1);
        assert_eq!(suite.passed(), 1);
        assert_eq!(suite.failed(), 0);

        let result = &suite.results[0];
        assert_eq!(result.id, "TestSuite:test:0:0");
        assert_eq!(result.group, "strings");
        assert!(result.expected);
        assert!(result.actual);
        assert!(result.passed);
        assert!(result.error.is_none());
        assert!(result.duration >= 0.0);
    }

    #[test]
    fn validator_errors_become_failed_results() {
        let dir = single_case_corpus();
        let adapter = adapter(&dir, Mode::Error("boom".to_string()));
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        assert_eq!(suite.failed(), 1);
        let result = &suite.results[0];
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.expected);
        assert!(!result.actual);
        assert!(!result.passed);
    }

    #[test]
    fn validator_panics_become_failed_results() {
        let dir = single_case_corpus();
        let adapter = adapter(&dir, Mode::Panic);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        assert_eq!(suite.failed(), 1);
        assert_eq!(suite.results[0].error.as_deref(), Some("validator exploded"));
    }

    #[test]
    fn mismatched_verdict_carries_the_assertion_message() {
        let dir = single_case_corpus();
        let adapter = adapter(&dir, Mode::AlwaysInvalid);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        assert_eq!(
            suite.results[0].error.as_deref(),
            Some("Expected data to be valid, but validator returned invalid")
        );
    }

    #[test]
    fn files_are_processed_in_lexicographic_order() {
        let group = |desc: &str| {
            json!([{"description": desc, "schema": true, "tests": [{"data": 1, "valid": true}, {"data": 2, "valid": true}]}])
        };
        let dir = corpus_dir(&[("z.json", group("last")), ("a.json", group("first")), ("m.json", group("middle"))]);
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        let groups: Vec<&str> = suite.results.iter().map(|result| result.group.as_str()).collect();
        assert_eq!(groups, ["first", "first", "middle", "middle", "last", "last"]);
    }

    #[test]
    fn runs_are_deterministic_modulo_duration() {
        let dir = corpus_dir(&[(
            "multi.json",
            json!([
                {"description": "g0", "schema": true, "tests": [{"data": 1, "valid": true}, {"data": 2, "valid": false}]},
                {"description": "g1", "schema": true, "tests": [{"data": 3, "valid": true}]}
            ]),
        )]);
        let adapter = adapter(&dir, Mode::AlwaysValid);

        let first = SequentialRunner::new(&adapter).run(None, None).unwrap();
        let second = SequentialRunner::new(&adapter).run(None, None).unwrap();

        assert_eq!(first.total(), second.total());
        for (a, b) in first.results.iter().zip(&second.results) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.passed, b.passed);
            assert_eq!(a.actual, b.actual);
            assert_eq!(a.error, b.error);
        }
    }

    #[test]
    fn case_ids_are_unique_within_a_suite() {
        let dir = corpus_dir(&[
            ("a.json", json!([{"schema": true, "tests": [{"data": 1}, {"data": 2}]}])),
            ("b.json", json!([{"schema": true, "tests": [{"data": 3}]}, {"schema": true, "tests": [{"data": 4}]}])),
        ]);
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();

        let mut ids: Vec<&str> = suite.results.iter().map(|result| result.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), suite.total());
    }

    #[test]
    fn case_filter_drops_results_after_execution() {
        let dir = corpus_dir(&[(
            "filtered.json",
            json!([
                {
                    "description": "group",
                    "schema": true,
                    "tests": [
                        {"description": "fast case", "data": 1, "valid": true, "tags": ["fast"]},
                        {"description": "slow case", "data": 2, "valid": true, "tags": ["slow"]}
                    ]
                }
            ]),
        )]);
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let policy = FilterConfig {
            tag: Some("fast".to_string()),
            ..FilterConfig::default()
        }
        .compile()
        .unwrap();

        let suite = SequentialRunner::new(&adapter).with_filter(&policy).run(None, None).unwrap();
        assert_eq!(suite.total(), 1);
        assert_eq!(suite.results[0].description, "fast case");
        // The index still reflects the original declaration position.
        assert!(suite.results[0].id.ends_with(":0:0"));
    }

    #[test]
    fn per_case_assertion_names_are_honored() {
        let dir = corpus_dir(&[(
            "assert.json",
            json!([
                {
                    "schema": true,
                    "tests": [
                        {"description": "lenient", "data": 1, "valid": false, "assertion": "any-of"}
                    ]
                }
            ]),
        )]);
        // StrictEquality would fail this case (expected false, actual true);
        // any-of with a scalar expectation behaves strictly too, so this
        // still fails, but through the named strategy's message.
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();
        assert!(!suite.results[0].passed);
        assert_eq!(
            suite.results[0].error.as_deref(),
            Some("Expected data to be invalid, but validator returned valid")
        );
    }

    #[test]
    fn counting_matches_execution() {
        let dir = corpus_dir(&[
            ("a.json", json!([{"schema": true, "tests": [{"data": 1}, "junk", {"data": 2}]}])),
            ("b.json", json!("not a corpus file")),
            ("notes.txt", json!("ignored by pattern")),
        ]);
        let adapter = adapter(&dir, Mode::AlwaysValid);
        let runner = SequentialRunner::new(&adapter);

        let files = runner.discover_files().unwrap();
        assert_eq!(files.len(), 2, "only *.json files are discovered");
        assert_eq!(runner.count_cases(&files), 2);

        let suite = runner.run(Some(files), None).unwrap();
        assert_eq!(suite.total(), 2);
    }

    #[test]
    fn missing_corpus_directory_yields_an_empty_suite() {
        let adapter = ScriptedAdapter {
            directory: PathBuf::from("no/such/directory"),
            mode: Mode::AlwaysValid,
        };
        let suite = SequentialRunner::new(&adapter).run(None, None).unwrap();
        assert_eq!(suite.total(), 0);
    }
}
