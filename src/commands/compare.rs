//! The compare subcommand.

use crate::adapter::{self, ADAPTER_NAMES, ValidatorAdapter};
use crate::cli::{Report, ReportItem, pluralize};
use crate::config::Config;
use crate::diff::{self, ComparisonReport};
use crate::filter::FilterConfig;
use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use yansi::Paint;

/// Options for comparing validators over the same corpus.
#[derive(Debug, Args)]
pub struct CompareSettings {
    /// The adapters to compare. Defaults to every known adapter that the
    /// configuration has not disabled.
    #[arg(short, long, value_delimiter = ',')]
    pub adapters: Vec<String>,
    /// Override the corpus directory for all adapters.
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
    /// Only compare cases whose name matches this regular expression.
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Skip cases whose name matches this regular expression.
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,
    /// Only compare cases carrying this tag.
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Print the comparison as JSON instead of human readable text.
    #[arg(long)]
    pub json: bool,
}

pub fn compare(settings: &CompareSettings) -> Result<ExitCode> {
    let config = Config::from_current()?;

    let names: Vec<String> = if settings.adapters.is_empty() {
        ADAPTER_NAMES
            .iter()
            .filter(|name| config.is_adapter_enabled(name))
            .map(|name| name.to_string())
            .collect()
    } else {
        settings.adapters.clone()
    };

    let mut adapters: BTreeMap<String, Box<dyn ValidatorAdapter>> = BTreeMap::new();
    for name in &names {
        let directory = settings.directory.clone().or_else(|| config.directory_for(name));
        adapters.insert(name.clone(), adapter::create(name, directory)?);
    }

    let filter_config = FilterConfig {
        name_regex: settings.filter.clone(),
        exclude_regex: settings.exclude.clone(),
        tag: settings.tag.clone(),
        ..FilterConfig::default()
    };
    let policy = filter_config.compile()?;

    let report = diff::compare(&adapters, Some(&policy))?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        pretty_print(&report);
    }

    if report.error.is_none() && report.discrepancies.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn pretty_print(report: &ComparisonReport) {
    if let Some(error) = &report.error {
        eprintln!("{} {error}", "error:".red().bold());
        return;
    }

    if report.discrepancies.is_empty() {
        println!(
            "All validators agree on {}",
            pluralize(report.total_cases, "aligned case")
        );
        return;
    }

    for discrepancy in &report.discrepancies {
        let mut block = Report {
            header: discrepancy.test_id.clone(),
            footer: vec![format!("agreement {}", discrepancy.agreement)],
            items: vec![ReportItem::Text(discrepancy.description.clone())],
        };

        let rows = discrepancy
            .outcomes
            .iter()
            .map(|(name, outcome)| {
                let verdict = if outcome.actual { "valid".green() } else { "invalid".red() };
                (name.clone(), verdict.to_string())
            })
            .collect();
        block.items.push(ReportItem::Table(rows));

        println!("\n{block}");
    }

    let discrepancies = match report.discrepancies.len() {
        1 => "1 discrepancy".to_string(),
        n => format!("{n} discrepancies"),
    };
    println!("{discrepancies} across {}", pluralize(report.total_cases, "aligned case"));
}
