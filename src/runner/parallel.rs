//! Multi-process execution over file batches.
//!
//! Parallelism is obtained by spawning child worker processes rather than
//! threads: each worker is handed a contiguous slice of the sorted file list
//! plus an adapter identifier, runs the sequential engine over it, and
//! writes its result list as JSON to a parent-chosen temporary file. The
//! parent waits for every worker and stitches the outputs back together in
//! batch order, which reproduces the sequential ordering exactly. A worker
//! that dies or produces unreadable output contributes nothing; the suite is
//! still produced.

use crate::Verbosity;
use crate::adapter::ValidatorAdapter;
use crate::cli::progress::ProgressReporter;
use crate::filter::FilterConfig;
use crate::runner::SequentialRunner;
use crate::suite::{TestResult, TestSuite};
use crate::util::{self, IteratorExt};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Everything a child process needs to reconstruct the adapter. Identifiers
/// plus data only; adapters cannot carry closures across the process
/// boundary.
pub struct WorkerSpec<'a> {
    pub adapter_id: &'a str,
    pub directory: PathBuf,
    pub verbosity: Verbosity,
}

/// Run the corpus across `workers` child processes.
///
/// With one worker or at most one file this simply delegates to the
/// sequential engine in-process.
pub fn run_parallel(
    adapter: &dyn ValidatorAdapter,
    spec: &WorkerSpec,
    filter_config: &FilterConfig,
    workers: usize,
    mut files: Vec<PathBuf>,
    mut progress: Option<&mut ProgressReporter>,
) -> Result<TestSuite> {
    files.sort();

    if workers <= 1 || files.len() <= 1 {
        let policy = filter_config.compile()?;
        return SequentialRunner::new(adapter)
            .with_filter(&policy)
            .run(Some(files), progress);
    }

    let start = Instant::now();

    // The workers need somewhere to put their results. The harness temp
    // directory is cleared on startup, so stale output files cannot leak
    // into this run.
    let scratch_dir = util::harness_temp_dir();
    std::fs::create_dir_all(&scratch_dir)
        .with_context(|| format!("Could not create the scratch directory '{}'", scratch_dir.display()))?;

    let batch_size = files.len().div_ceil(workers);
    let batches: Vec<&[PathBuf]> = files.chunks(batch_size).collect();

    let outputs = batches
        .iter()
        .map(|_| {
            tempfile::Builder::new()
                .suffix(".json")
                .tempfile_in(&scratch_dir)
                .map(|file| file.into_temp_path())
                .context("Could not create a worker output file")
        })
        .collect::<Result<Vec<_>>>()?;

    // Dispatch all batches concurrently and wait for every worker. The
    // parallel bridge does not preserve order, so contributions are indexed
    // and re-sorted before concatenation.
    let mut contributions: Vec<(usize, Vec<TestResult>)> = batches
        .iter()
        .zip(&outputs)
        .enumerate()
        .map_parallel(true, |(index, (batch, output))| {
            (index, run_batch_worker(spec, filter_config, batch, output))
        })
        .collect();

    contributions.sort_by_key(|(index, _)| *index);

    let results: Vec<TestResult> = contributions
        .into_iter()
        .flat_map(|(_, results)| results)
        .collect();

    if let Some(progress) = progress.as_deref_mut() {
        for result in &results {
            progress.advance(result);
        }
    }

    Ok(TestSuite {
        name: adapter.name(),
        results,
        duration: start.elapsed().as_secs_f64(),
    })
}

/// Spawn one worker and collect its results. Any failure along the way
/// degrades to an empty contribution.
fn run_batch_worker(spec: &WorkerSpec, filter_config: &FilterConfig, batch: &[PathBuf], output: &Path) -> Vec<TestResult> {
    match try_run_batch_worker(spec, filter_config, batch, output) {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!("a worker batch of {} files produced no results: {err:#}", batch.len());
            Vec::new()
        }
    }
}

fn try_run_batch_worker(
    spec: &WorkerSpec,
    filter_config: &FilterConfig,
    batch: &[PathBuf],
    output: &Path,
) -> Result<Vec<TestResult>> {
    // The worker is this same binary invoked with a hidden subcommand. The
    // results travel through a file instead of STDIO so validator output
    // cannot corrupt them.
    let mut command =
        Command::new(std::env::current_exe().context("Could not find the path to the current executable")?);

    command
        .arg("--verbosity")
        .arg(spec.verbosity.to_possible_value().unwrap().get_name())
        .arg("run-batch")
        .args(["--adapter", spec.adapter_id])
        .args([OsStr::new("--directory"), spec.directory.as_os_str()])
        .args([OsStr::new("--output-file"), output.as_os_str()]);

    if !filter_config.is_empty() {
        let filter_json =
            serde_json::to_string(filter_config).context("Could not serialize the filter configuration")?;
        command.args(["--filter-json", filter_json.as_str()]);
    }

    for file in batch {
        command.arg(file);
    }

    let status = command
        .spawn()
        .context("Could not spawn a batch worker process")?
        .wait()
        .context("Error while waiting on a batch worker")?;

    if !status.success() {
        anyhow::bail!("worker exited with {status}");
    }

    read_batch_results(output)
}

/// Decode one worker's output file into a result list.
pub(crate) fn read_batch_results(path: &Path) -> Result<Vec<TestResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read the worker output from '{}'", path.display()))?;

    serde_json::from_str(&content).context("Could not parse the worker output as a result list")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Verdict;
    use serde_json::json;

    #[derive(Debug)]
    struct AlwaysValid {
        directory: PathBuf,
    }

    impl ValidatorAdapter for AlwaysValid {
        fn name(&self) -> String {
            "always-valid".to_string()
        }

        fn test_directory(&self) -> PathBuf {
            self.directory.clone()
        }

        fn validate(&self, _data: &serde_json::Value, _schema: &serde_json::Value) -> Result<Verdict> {
            Ok(Verdict::valid())
        }
    }

    #[test]
    fn single_worker_delegates_to_the_sequential_engine() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("only.json"),
            json!([{"schema": true, "tests": [{"data": 1, "valid": true}]}]).to_string(),
        )
        .unwrap();

        let adapter = AlwaysValid {
            directory: dir.path().to_path_buf(),
        };
        let spec = WorkerSpec {
            adapter_id: "always-valid",
            directory: dir.path().to_path_buf(),
            verbosity: Verbosity::Quiet,
        };

        let files = vec![dir.path().join("only.json")];
        let suite = run_parallel(&adapter, &spec, &FilterConfig::default(), 1, files, None).unwrap();
        assert_eq!(suite.total(), 1);
        assert!(suite.all_passed());
    }

    #[test]
    fn batch_sizes_use_ceiling_division() {
        // Five files over two workers gives batches of three and two; the
        // remainder can also produce more batches than workers.
        assert_eq!(5usize.div_ceil(2), 3);
        let files: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("{i}.json"))).collect();
        let batches: Vec<&[PathBuf]> = files.chunks(3).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 2);

        let files: Vec<PathBuf> = (0..7).map(|i| PathBuf::from(format!("{i}.json"))).collect();
        let batches: Vec<&[PathBuf]> = files.chunks(7usize.div_ceil(3)).collect();
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn missing_worker_output_reads_as_an_error() {
        assert!(read_batch_results(Path::new("no/such/output.json")).is_err());
    }

    #[test]
    fn malformed_worker_output_reads_as_an_error() {
        let dir = tempfile::TempDir::new().unwrap();

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "").unwrap();
        assert!(read_batch_results(&empty).is_err());

        let non_list = dir.path().join("object.json");
        std::fs::write(&non_list, "{}").unwrap();
        assert!(read_batch_results(&non_list).is_err());
    }

    #[test]
    fn well_formed_worker_output_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let results = vec![TestResult {
            id: "s:f:0:0".to_string(),
            file: PathBuf::from("f.json"),
            group: "g".to_string(),
            description: "d".to_string(),
            data: json!(1),
            expected: true,
            actual: true,
            passed: true,
            error: None,
            duration: 0.01,
            tags: vec!["fuzzed".to_string()],
        }];

        std::fs::write(&path, serde_json::to_string(&results).unwrap()).unwrap();
        let decoded = read_batch_results(&path).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "s:f:0:0");
    }
}
