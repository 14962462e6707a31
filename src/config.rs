//! Optional project configuration.
//!
//! A `prism.json` file is discovered by scanning from the working directory
//! upward, or named explicitly through the `PRISM_CONFIG` environment
//! variable. No config anywhere means defaults; a config that is named but
//! unreadable or malformed is a hard error.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "prism.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The adapter to run when the CLI does not name one.
    pub adapter: Option<String>,
    /// Corpus directory applied to adapters without their own override.
    pub directory: Option<PathBuf>,
    /// Per-adapter settings keyed by adapter identifier.
    pub adapters: FxHashMap<String, AdapterConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub directory: Option<PathBuf>,
    pub enabled: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            directory: None,
            enabled: true,
        }
    }
}

impl Config {
    /// Resolve the active configuration for the current working directory.
    pub fn from_current() -> Result<Self> {
        // An explicit override must load; missing defaults are fine.
        if let Ok(path) = std::env::var("PRISM_CONFIG") {
            return Self::from_file(&path).context(path);
        }

        let mut current_dir = std::env::current_dir()?.canonicalize()?;
        loop {
            let candidate = current_dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Self::from_file(&candidate);
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        serde_json::from_str(&content).with_context(|| path.display().to_string())
    }

    /// The corpus directory for an adapter: its own override first, then the
    /// global one.
    pub fn directory_for(&self, adapter: &str) -> Option<PathBuf> {
        self.adapters
            .get(adapter)
            .and_then(|config| config.directory.clone())
            .or_else(|| self.directory.clone())
    }

    pub fn is_adapter_enabled(&self, adapter: &str) -> bool {
        self.adapters.get(adapter).map(|config| config.enabled).unwrap_or(true)
    }
}
