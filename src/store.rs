//! Persistence of run artifacts under the `.prism` directory.
//!
//! Snapshots capture per-case verdicts for regression diffing; baselines
//! capture per-case timings for performance diffing. Both are pretty-printed
//! JSON files keyed by suite name. Reads degrade to "no prior data" on any
//! failure; only the inability to create the store directory surfaces as an
//! error.

use serde::de::DeserializeOwned;
use std::path::Path;

pub mod baseline;
pub mod snapshot;

/// Read and decode a JSON artifact, treating every failure as absence.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// The current wall clock time as unix seconds, used to stamp artifacts.
pub(crate) fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
