//! The fuzz subcommand.

use crate::adapter;
use crate::cli::{Report, ReportItem, pluralize};
use crate::config::Config;
use crate::fuzz::FuzzEngine;
use crate::suite::TestSuite;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use yansi::Paint;

/// Options for fuzzing a validator.
#[derive(Debug, Args)]
pub struct FuzzSettings {
    /// The validator adapter to drive.
    #[arg(short, long)]
    pub adapter: Option<String>,
    /// Override the adapter's corpus directory. Fuzzing does not read the
    /// corpus, but the adapter still needs one to be constructed.
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
    /// Number of random inputs to generate on top of the fixed edge cases.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub iterations: usize,
    /// Seed for the random input generator. Defaults to a fixed seed so
    /// fuzz runs are reproducible.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print the suite as JSON instead of human readable text.
    #[arg(long)]
    pub json: bool,
}

pub fn fuzz(settings: &FuzzSettings) -> Result<ExitCode> {
    let config = Config::from_current()?;

    let adapter_id = settings
        .adapter
        .clone()
        .or_else(|| config.adapter.clone())
        .unwrap_or_else(|| adapter::builtin::ACCEPT_ALL.to_string());
    let directory = settings.directory.clone().or_else(|| config.directory_for(&adapter_id));
    let adapter = adapter::create(&adapter_id, directory)?;

    let mut engine = FuzzEngine::new(settings.iterations);
    if let Some(seed) = settings.seed {
        engine = engine.with_seed(seed);
    }

    let suite = engine.run(adapter.as_ref());

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&suite)?);
    } else {
        pretty_print(&suite);
    }

    if suite.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn pretty_print(suite: &TestSuite) {
    let mut report = Report {
        header: suite.name.clone(),
        footer: vec![
            pluralize(suite.total(), "input"),
            format!("{:.2}s", suite.duration).dim().to_string(),
        ],
        items: Vec::new(),
    };

    // Fuzz findings are the interesting part; passing inputs stay quiet.
    for result in suite.results.iter().filter(|result| !result.passed) {
        let mut finding = Report {
            header: result.id.clone(),
            footer: vec!["FAILED".red().to_string()],
            items: vec![ReportItem::Text(result.description.clone())],
        };

        if let Some(error) = &result.error {
            finding.items.push(ReportItem::Text(error.clone()));
        }

        report.items.push(ReportItem::Child(finding));
    }

    if suite.all_passed() {
        report.items.push(ReportItem::Text("No findings".to_string()));
    }

    println!("\n{report}");
    println!(
        "{} run, {} passed, {} failed",
        pluralize(suite.total(), "input"),
        suite.passed(),
        suite.failed()
    );
}
