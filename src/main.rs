use clap::{Parser, Subcommand};
use prism::{Verbosity, commands, debug, util};
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use yansi::Paint;

#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
struct Cli {
    /// prism's own logging verbosity.
    ///
    /// This can be used to silence all non-essential output, or to enable
    /// more in depth tracing.
    #[arg(short, long, default_value = "info")]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Command,
}

/// The harness's subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run a validator over its conformance corpus.
    Run(commands::run::RunSettings),

    /// Drive a validator with synthesized edge-case and random inputs.
    Fuzz(commands::fuzz::FuzzSettings),

    /// Run several validators over the same corpus and report disagreements.
    Compare(commands::compare::CompareSettings),

    /// List available adapters and assertion strategies.
    #[command(subcommand)]
    List(commands::list::ListCommand),

    /// Edit run options in a menu and launch runs from there.
    Interactive,

    /// Run a single file batch and write the results to a file.
    ///
    /// This is used by parallel execution. Since it's merely an
    /// implementation detail, the option is not shown in the CLI.
    #[command(hide = true)]
    RunBatch(commands::run::BatchSettings),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Worker scratch files from a previous run are cleared on a fresh top
    // level invocation. Batch workers must leave the directory alone while
    // their siblings are still writing to it.
    if !matches!(cli.command, Command::RunBatch(_)) {
        let _ = std::fs::remove_dir_all(util::harness_temp_dir());
        let _ = std::fs::create_dir_all(util::harness_temp_dir());
    }

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry().with(debug::StderrLayer::new(cli.verbosity.level_filter())),
    )
    .unwrap();

    debug::install_panic_hook();

    let result = match cli.command {
        Command::Run(settings) => commands::run::run(cli.verbosity, &settings),
        Command::Fuzz(settings) => commands::fuzz::fuzz(&settings),
        Command::Compare(settings) => commands::compare::compare(&settings),
        Command::List(command) => commands::list::list(command),
        Command::Interactive => commands::interactive::interactive(cli.verbosity),

        Command::RunBatch(settings) => commands::run::run_batch(&settings),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
