//! Polling watch mode.
//!
//! The corpus tree is rescanned at a fixed interval and compared against the
//! previous scan; any added, removed, or modified file triggers the
//! callback. Polling is deliberately portable across platforms and network
//! filesystems. Detection is edge-triggered: changes that land while the
//! callback is running collapse into a single trigger on the next poll.

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, tick};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;
use yansi::Paint;

pub struct WatchLoop {
    directory: PathBuf,
    patterns: Vec<String>,
    interval: Duration,
}

/// What a poll observed about a single path.
#[derive(Debug, PartialEq, Eq)]
enum Change {
    Added(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
}

impl Change {
    fn describe(&self) -> String {
        match self {
            Change::Added(path) => format!("'{}' was added", path.display()),
            Change::Removed(path) => format!("'{}' was removed", path.display()),
            Change::Modified(path) => format!("'{}' changed", path.display()),
        }
    }
}

impl WatchLoop {
    pub fn new(directory: PathBuf, patterns: Vec<String>, interval: Duration) -> Self {
        Self {
            directory,
            patterns,
            interval,
        }
    }

    /// Announce, run the callback once, then poll until `stop` fires or its
    /// sender is dropped. Callback errors abort the loop.
    pub fn run(&self, mut callback: impl FnMut() -> Result<()>, stop: Receiver<()>) -> Result<()> {
        let patterns = self.compile_patterns()?;

        println!(
            "Watching '{}' (polling every {:.1}s, interrupt to stop)",
            self.directory.display(),
            self.interval.as_secs_f64()
        );

        callback()?;
        let mut seen = self.scan(&patterns);

        let ticker = tick(self.interval);
        loop {
            crossbeam::select! {
                recv(ticker) -> _ => {
                    let current = self.scan(&patterns);
                    if let Some(change) = first_change(&seen, &current) {
                        println!("{}", format!("Change detected: {}", change.describe()).dim());

                        // Adopt the triggering scan before running the
                        // callback so that modifications made while it runs
                        // are picked up on the next poll.
                        seen = current;
                        callback()?;
                    }
                }
                recv(stop) -> _ => break,
            }
        }

        Ok(())
    }

    fn compile_patterns(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            builder.add(Glob::new(pattern).with_context(|| format!("Could not parse the file pattern '{pattern}'"))?);
        }

        builder.build().context("Could not compile the watch file patterns")
    }

    /// Map every matching file under the corpus root to its modification
    /// time. Unreadable entries are skipped.
    fn scan(&self, patterns: &GlobSet) -> FxHashMap<PathBuf, SystemTime> {
        let mut snapshot = FxHashMap::default();

        for entry in WalkDir::new(&self.directory).into_iter().filter_map(|entry| entry.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            if !entry.path().file_name().is_some_and(|name| patterns.is_match(name)) {
                continue;
            }

            if let Ok(metadata) = entry.metadata()
                && let Ok(modified) = metadata.modified()
            {
                snapshot.insert(entry.into_path(), modified);
            }
        }

        snapshot
    }
}

/// The first difference between two scans, if any. Additions and
/// modifications are checked before removals.
fn first_change(previous: &FxHashMap<PathBuf, SystemTime>, current: &FxHashMap<PathBuf, SystemTime>) -> Option<Change> {
    for (path, mtime) in current {
        match previous.get(path) {
            None => return Some(Change::Added(path.clone())),
            Some(seen) if seen != mtime => return Some(Change::Modified(path.clone())),
            Some(_) => {}
        }
    }

    previous
        .keys()
        .find(|path| !current.contains_key(path.as_path()))
        .map(|path| Change::Removed(path.clone()))
}
