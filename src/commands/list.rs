//! Commands for listing the harness's registries.

use crate::adapter::{self, ADAPTER_NAMES};
use crate::assertions::AssertionRegistry;
use crate::cli::{Report, ReportItem, pluralize};
use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

#[derive(Subcommand)]
pub enum ListCommand {
    /// Lists the available validator adapters.
    Adapters {
        /// Print JSON instead of a human readable format.
        #[arg(short, long)]
        json: bool,
    },
    /// Lists the registered assertion strategies.
    Assertions {
        /// Print JSON instead of a human readable format.
        #[arg(short, long)]
        json: bool,
    },
}

pub fn list(command: ListCommand) -> Result<ExitCode> {
    match command {
        ListCommand::Adapters { json } => list_adapters(json),
        ListCommand::Assertions { json } => list_assertions(json),
    }
}

fn adapter_description(name: &str) -> &'static str {
    match name {
        adapter::builtin::ACCEPT_ALL => "Accepts every data instance. Useful as a fuzz target and as a baseline.",
        adapter::builtin::TYPECHECK => "A minimal schema interpreter covering boolean schemas, 'type' and 'enum'.",
        _ => "",
    }
}

fn list_adapters(json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(ADAPTER_NAMES)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut report = Report {
        header: "Validator adapters".to_string(),
        footer: vec![pluralize(ADAPTER_NAMES.len(), "adapter")],
        items: Vec::new(),
    };

    for name in ADAPTER_NAMES {
        report.items.push(ReportItem::Child(Report {
            header: name.to_string(),
            footer: Vec::new(),
            items: vec![ReportItem::Text(adapter_description(name).to_string())],
        }));
    }

    println!("\n{report}");
    Ok(ExitCode::SUCCESS)
}

fn list_assertions(json: bool) -> Result<ExitCode> {
    let names = AssertionRegistry::default().names();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(ExitCode::SUCCESS);
    }

    let footer = match names.len() {
        1 => "1 strategy".to_string(),
        n => format!("{n} strategies"),
    };
    let mut report = Report {
        header: "Assertion strategies".to_string(),
        footer: vec![footer],
        items: Vec::new(),
    };

    for name in names {
        report.items.push(ReportItem::Text(name.to_string()));
    }

    println!("\n{report}");
    Ok(ExitCode::SUCCESS)
}
