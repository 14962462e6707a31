//! Skipping files whose modification time has not changed.
//!
//! The cache is a JSON object mapping absolute paths to modification times
//! in integer seconds. Any problem reading it means "no cache" and the full
//! file list runs. When the cache exists but nothing changed, the full list
//! also runs; an incremental run never silently shrinks to zero work.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

pub const DEFAULT_CACHE_PATH: &str = ".prism/cache/incremental.json";

pub struct IncrementalCache {
    path: PathBuf,
}

impl Default for IncrementalCache {
    fn default() -> Self {
        Self::at(PathBuf::from(DEFAULT_CACHE_PATH))
    }
}

impl IncrementalCache {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// The stored path to mtime map, or `None` when there is no usable
    /// cache.
    pub fn load(&self) -> Option<FxHashMap<String, i64>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Reduce `files` to those that changed since the cache was written.
    /// Without a cache, or when nothing changed, the original list is
    /// returned unchanged.
    pub fn filter_changed(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        let Some(cache) = self.load() else {
            return files.to_vec();
        };

        let changed: Vec<PathBuf> = files
            .iter()
            .filter(|file| {
                match (mtime_seconds(file), cache.get(&cache_key(file))) {
                    (Some(mtime), Some(cached)) => mtime != *cached,
                    // Unknown to the cache, or the mtime is unreadable.
                    _ => true,
                }
            })
            .cloned()
            .collect();

        if changed.is_empty() { files.to_vec() } else { changed }
    }

    /// Record the current modification times of `files`. Files without a
    /// readable mtime are omitted. The write goes through a temporary file
    /// in the cache directory and an atomic rename.
    pub fn save(&self, files: &[PathBuf]) -> Result<()> {
        let mut entries = BTreeMap::new();
        for file in files {
            if let Some(mtime) = mtime_seconds(file) {
                entries.insert(cache_key(file), mtime);
            }
        }

        let directory = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(directory)
            .with_context(|| format!("Could not create the cache directory '{}'", directory.display()))?;

        let mut staging = tempfile::NamedTempFile::new_in(directory)
            .context("Could not create a staging file for the incremental cache")?;
        staging
            .write_all(serde_json::to_string_pretty(&entries)?.as_bytes())
            .context("Could not write the incremental cache")?;
        staging
            .persist(&self.path)
            .with_context(|| format!("Could not persist the incremental cache to '{}'", self.path.display()))?;

        Ok(())
    }
}

/// Cache keys are canonicalized absolute paths where possible, so relative
/// and absolute spellings of the same file share an entry.
fn cache_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn mtime_seconds(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).and_then(|metadata| metadata.modified()).ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn cache_in(dir: &tempfile::TempDir) -> IncrementalCache {
        IncrementalCache::at(dir.path().join("cache").join("incremental.json"))
    }

    fn touch(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "[]").unwrap();
        path
    }

    /// Bump a file's mtime well past one-second cache granularity.
    fn bump_mtime(path: &Path) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn missing_cache_means_run_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let files = vec![touch(&dir, "a.json"), touch(&dir, "b.json")];
        assert_eq!(cache_in(&dir).filter_changed(&files), files);
    }

    #[test]
    fn corrupt_cache_means_run_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        std::fs::create_dir_all(cache.path.parent().unwrap()).unwrap();
        std::fs::write(&cache.path, "not json at all").unwrap();

        let files = vec![touch(&dir, "a.json")];
        assert_eq!(cache.filter_changed(&files), files);
        assert!(cache.load().is_none());

        // A non-object root is just as unusable.
        std::fs::write(&cache.path, "[1, 2, 3]").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn unchanged_files_trigger_a_full_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let files = vec![touch(&dir, "a.json"), touch(&dir, "b.json")];

        cache.save(&files).unwrap();
        // Nothing changed, so the guard returns the original list.
        assert_eq!(cache.filter_changed(&files), files);
    }

    #[test]
    fn only_modified_files_are_selected() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let a = touch(&dir, "a.json");
        let b = touch(&dir, "b.json");
        let files = vec![a.clone(), b];

        cache.save(&files).unwrap();
        bump_mtime(&a);

        assert_eq!(cache.filter_changed(&files), vec![a]);
    }

    #[test]
    fn files_unknown_to_the_cache_count_as_changed() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let a = touch(&dir, "a.json");
        cache.save(std::slice::from_ref(&a)).unwrap();

        let b = touch(&dir, "b.json");
        assert_eq!(cache.filter_changed(&[a, b.clone()]), vec![b]);
    }

    #[test]
    fn save_omits_files_without_a_readable_mtime() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let a = touch(&dir, "a.json");
        let ghost = dir.path().join("ghost.json");

        cache.save(&[a, ghost]).unwrap();
        let stored = cache.load().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn save_creates_the_cache_directory_and_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = cache_in(&dir);
        let a = touch(&dir, "a.json");

        cache.save(std::slice::from_ref(&a)).unwrap();
        let stored = cache.load().unwrap();
        assert_eq!(stored.len(), 1);
        let key = stored.keys().next().unwrap();
        assert!(key.ends_with("a.json"));
        assert!(*stored.values().next().unwrap() > 0);
    }
}
