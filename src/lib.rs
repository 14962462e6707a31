//! prism is a conformance test harness for JSON schema validators. It
//! discovers declarative test files, drives a pluggable validator adapter
//! over every case, and reports how the observed verdicts compare to the
//! expected ones. On top of the core loop sit several execution modes:
//! multi-process parallelism, incremental re-runs, a polling watch loop,
//! input fuzzing, differential validator comparison, snapshots, baselines,
//! and coverage analysis.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

pub mod adapter;
pub mod assertions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod coverage;
pub mod debug;
pub mod diff;
pub mod filter;
pub mod fuzz;
pub mod incremental;
pub mod json_diff;
pub mod runner;
pub mod store;
pub mod suite;
pub mod util;
pub mod value;
pub mod watch;

/// The harness's own logging verbosity. This does not affect validator
/// output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verbosity {
    /// Suppress all logging output from the harness itself.
    Quiet,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::OFF,
            Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}
