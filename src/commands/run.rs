//! The run orchestrator and the hidden batch worker command.
//!
//! `run` composes the selected execution modes around the core loop:
//! incremental filtering in front, sequential or multi-process execution in
//! the middle, and snapshot / baseline / coverage reporting behind it.
//! `run-batch` is the child process entry point for parallel execution.

use crate::adapter::{self, ValidatorAdapter};
use crate::cli::progress::{ProgressMode, ProgressReporter};
use crate::cli::{Report, ReportItem, pluralize};
use crate::config::Config;
use crate::coverage::{self, CoverageReport};
use crate::filter::FilterConfig;
use crate::incremental::IncrementalCache;
use crate::json_diff;
use crate::runner::parallel::{self, WorkerSpec};
use crate::runner::SequentialRunner;
use crate::store::baseline::BaselineStore;
use crate::store::snapshot::{SnapshotRecord, SnapshotStore};
use crate::suite::{TestResult, TestSuite};
use crate::watch::WatchLoop;
use crate::Verbosity;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use yansi::Paint;

/// Options for running a validator over its corpus.
#[derive(Debug, Args)]
pub struct RunSettings {
    /// Explicit test files to run instead of scanning the corpus directory.
    pub paths: Vec<PathBuf>,
    /// The validator adapter to drive.
    #[arg(short, long)]
    pub adapter: Option<String>,
    /// Override the adapter's corpus directory.
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
    /// Only run cases whose "<group> - <description>" name matches this
    /// regular expression.
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Skip cases whose name matches this regular expression.
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,
    /// Only run cases carrying this tag.
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Only run test files whose path matches this glob pattern.
    #[arg(long)]
    pub path: Option<String>,
    /// Number of worker processes to spread file batches over.
    #[arg(short = 'j', long, default_value_t = 1)]
    pub parallel: usize,
    /// Only run files that changed since the previous run.
    #[arg(long)]
    pub incremental: bool,
    /// Poll the corpus for changes and re-run on every change.
    #[arg(long)]
    pub watch: bool,
    /// Poll interval for --watch, in seconds.
    #[arg(long, default_value_t = 2)]
    pub watch_interval: u64,
    /// Print one line per test case instead of a progress bar.
    #[arg(short, long)]
    pub verbose: bool,
    /// Persist the suite's verdicts as a snapshot and report verdict flips
    /// against the previous one.
    #[arg(long)]
    pub snapshot: bool,
    /// Persist per-case timings under this baseline name.
    #[arg(long, value_name = "NAME")]
    pub baseline: Option<String>,
    /// Print a coverage summary for the run.
    #[arg(long)]
    pub coverage: bool,
    /// Print the suite as JSON instead of human readable text.
    #[arg(long)]
    pub json: bool,
    /// Only show failed cases.
    #[arg(long)]
    pub only_failed: bool,
}

/// Options for running a single file batch. This is the child process side
/// of parallel execution and is hidden from the CLI.
#[derive(Debug, Args)]
pub struct BatchSettings {
    /// The adapter identifier to reconstruct in this worker.
    #[arg(long)]
    pub adapter: String,
    /// The corpus directory for the reconstructed adapter.
    #[arg(long)]
    pub directory: PathBuf,
    /// The file to write the serialized result list to. Results travel
    /// through a file because validators may write to STDIO themselves.
    #[arg(long)]
    pub output_file: PathBuf,
    /// The filter configuration as JSON.
    #[arg(long)]
    pub filter_json: Option<String>,
    /// The test files in this batch.
    pub files: Vec<PathBuf>,
}

/// The main run command.
pub fn run(verbosity: Verbosity, settings: &RunSettings) -> Result<ExitCode> {
    let config = Config::from_current()?;

    let adapter_id = settings
        .adapter
        .clone()
        .or_else(|| config.adapter.clone())
        .unwrap_or_else(|| adapter::builtin::TYPECHECK.to_string());
    let directory = settings.directory.clone().or_else(|| config.directory_for(&adapter_id));
    let adapter = adapter::create(&adapter_id, directory)?;

    let filter_config = FilterConfig {
        path_glob: settings.path.clone(),
        name_regex: settings.filter.clone(),
        exclude_regex: settings.exclude.clone(),
        tag: settings.tag.clone(),
    };
    // Surface bad patterns before any work happens.
    filter_config.compile()?;

    if settings.watch {
        let watcher = WatchLoop::new(
            adapter.test_directory(),
            adapter.file_patterns(),
            Duration::from_secs(settings.watch_interval.max(1)),
        );

        // The loop ends only through outside interruption; the sender stays
        // alive for as long as the watch runs.
        let (_stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(1);
        watcher.run(
            || {
                let _ = execute_once(verbosity, settings, adapter.as_ref(), &adapter_id, &filter_config)?;
                Ok(())
            },
            stop_rx,
        )?;

        return Ok(ExitCode::SUCCESS);
    }

    execute_once(verbosity, settings, adapter.as_ref(), &adapter_id, &filter_config)
}

/// One complete pass: discover, filter, execute, report, persist.
fn execute_once(
    verbosity: Verbosity,
    settings: &RunSettings,
    adapter: &dyn ValidatorAdapter,
    adapter_id: &str,
    filter_config: &FilterConfig,
) -> Result<ExitCode> {
    let policy = filter_config.compile()?;
    let runner = SequentialRunner::new(adapter).with_filter(&policy);

    let discovered = if settings.paths.is_empty() {
        runner.discover_files()?
    } else {
        let mut paths = settings.paths.clone();
        paths.sort();
        paths
    };

    let cache = IncrementalCache::default();
    let files = if settings.incremental {
        cache.filter_changed(&discovered)
    } else {
        discovered.clone()
    };

    let mut progress = ProgressReporter::stderr(if settings.verbose {
        ProgressMode::Verbose
    } else {
        ProgressMode::Compact
    });
    progress.start(runner.count_cases(&files));

    let suite = if settings.parallel > 1 {
        let spec = WorkerSpec {
            adapter_id,
            directory: adapter.test_directory(),
            verbosity,
        };
        parallel::run_parallel(adapter, &spec, filter_config, settings.parallel, files, Some(&mut progress))?
    } else {
        runner.run(Some(files), Some(&mut progress))?
    };

    progress.finish();

    // The cache records the whole discovered corpus, not just the subset
    // this pass executed, so the next incremental run compares against a
    // complete picture.
    if settings.incremental
        && let Err(err) = cache.save(&discovered)
    {
        tracing::warn!("could not update the incremental cache: {err:#}");
    }

    if settings.snapshot {
        persist_snapshot(&suite)?;
    }

    if let Some(name) = &settings.baseline {
        persist_baseline(name, &suite)?;
    }

    if settings.coverage {
        print_coverage(&coverage::analyze(std::slice::from_ref(&suite)));
    }

    if settings.json {
        let printable = if settings.only_failed { suite.only_failed() } else { suite.clone() };
        println!("{}", serde_json::to_string_pretty(&printable)?);
    } else {
        pretty_print(&suite, settings.only_failed);
    }

    if suite.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// The hidden worker command: run the batch sequentially and write the
/// results to the output file.
pub fn run_batch(settings: &BatchSettings) -> Result<ExitCode> {
    let adapter = adapter::create(&settings.adapter, Some(settings.directory.clone()))?;

    let filter_config: FilterConfig = settings
        .filter_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("Could not parse the worker filter configuration")?
        .unwrap_or_default();
    let policy = filter_config.compile()?;

    let suite = SequentialRunner::new(adapter.as_ref())
        .with_filter(&policy)
        .run(Some(settings.files.clone()), None)?;

    std::fs::write(
        &settings.output_file,
        serde_json::to_string(&suite.results).context("Could not serialize the batch results to JSON")?,
    )
    .with_context(|| format!("Could not write the batch results to '{}'", settings.output_file.display()))?;

    Ok(ExitCode::SUCCESS)
}

fn persist_snapshot(suite: &TestSuite) -> Result<()> {
    let store = SnapshotStore::default();
    let current = SnapshotRecord::from_suite(suite);

    if let Some(previous) = store.load_record(&suite.name) {
        let changes = previous.verdict_changes(&current);
        if changes.is_empty() {
            println!("No verdict changes against the previous snapshot");
        } else {
            let mut report = Report {
                header: "Verdict changes since the previous snapshot".to_string(),
                footer: vec![pluralize(changes.len(), "change")],
                items: Vec::new(),
            };

            for id in &changes {
                let before = serde_json::to_value(&previous.results[id]).unwrap_or(serde_json::Value::Null);
                let after = serde_json::to_value(&current.results[id]).unwrap_or(serde_json::Value::Null);
                let label = if current.results[id].passed {
                    "now passes".green().to_string()
                } else {
                    "now fails".red().to_string()
                };

                report.items.push(ReportItem::Child(Report {
                    header: id.clone(),
                    footer: vec![label],
                    items: vec![ReportItem::Text(json_diff::diff(&before, &after))],
                }));
            }

            println!("\n{report}");
        }
    }

    let path = store.save(suite)?;
    println!("Snapshot written to '{}'", path.display());
    Ok(())
}

fn persist_baseline(name: &str, suite: &TestSuite) -> Result<()> {
    let store = BaselineStore::default();

    if let Some(previous) = store.load(name).and_then(|mut document| document.remove(&suite.name)) {
        let delta = suite.duration - previous.total_duration;
        println!(
            "Baseline '{name}': {:.2}s before, {:.2}s now ({}{:.2}s)",
            previous.total_duration,
            suite.duration,
            if delta >= 0.0 { "+" } else { "" },
            delta
        );
    }

    let path = store.save(name, std::slice::from_ref(suite))?;
    println!("Baseline written to '{}'", path.display());
    Ok(())
}

fn print_coverage(report: &CoverageReport) {
    let mut rows = vec![
        (
            "tests".to_string(),
            format!(
                "{} total, {} passed, {} failed",
                report.total_tests, report.passed_tests, report.failed_tests
            ),
        ),
        ("pass rate".to_string(), format!("{:.1}%", report.pass_rate)),
        ("groups".to_string(), pluralize(report.distinct_groups(), "distinct group")),
        ("files".to_string(), pluralize(report.distinct_files(), "distinct file")),
        ("tags".to_string(), pluralize(report.distinct_tags(), "distinct tag")),
    ];

    // The busiest groups give a quick sense of corpus composition.
    for (group, count) in report.group_distribution.iter().take(5) {
        rows.push((format!("group '{group}'"), pluralize(*count, "case")));
    }

    let report = Report {
        header: "Coverage".to_string(),
        footer: vec![format!("score {:.1}", report.coverage_score)],
        items: vec![ReportItem::Table(rows)],
    };

    println!("\n{report}");
}

fn pretty_print(suite: &TestSuite, only_failed: bool) {
    let mut report = Report {
        header: suite.name.clone(),
        footer: vec![
            pluralize(suite.total(), "test"),
            format!("{:.2}s", suite.duration).dim().to_string(),
        ],
        items: Vec::new(),
    };

    for result in suite.results.iter().filter(|result| !only_failed || !result.passed) {
        report.items.push(ReportItem::Child(report_case(result)));
    }

    println!("\n{report}");
    println!(
        "{} run, {} passed, {} failed",
        pluralize(suite.total(), "test"),
        suite.passed(),
        suite.failed()
    );
}

fn report_case(result: &TestResult) -> Report {
    let status = if result.passed {
        "PASSED".green().to_string()
    } else {
        "FAILED".red().to_string()
    };

    let mut report = Report {
        header: result.id.clone(),
        footer: vec![status, format!("{:.0}ms", result.duration * 1_000.0).dim().to_string()],
        items: vec![ReportItem::Text(format!("{} – {}", result.group, result.description))],
    };

    if let Some(error) = &result.error {
        report.items.push(ReportItem::Child(Report {
            header: String::new(),
            footer: Vec::new(),
            items: vec![ReportItem::Text(error.clone())],
        }));
    }

    report
}
