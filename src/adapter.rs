//! The contract between the harness and concrete validator implementations.
//!
//! The engine is validator-agnostic: everything it needs from a validator is
//! expressed by the [`ValidatorAdapter`] trait. Batch workers run in a
//! separate process and cannot receive a trait object from the parent, so
//! adapters are identified by name and reconstructed from the registry in
//! [`create`]; adapter state must therefore be plain data.

use anyhow::{Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub mod builtin;

/// The outcome of validating one data instance against a schema.
#[derive(Debug, Clone)]
pub struct Verdict {
    valid: bool,
    errors: Vec<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self { valid: false, errors }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Wraps one concrete validator.
pub trait ValidatorAdapter: Send + Sync + std::fmt::Debug {
    /// Human readable suite name. Also the prefix of every case id.
    fn name(&self) -> String;

    /// Root of the corpus this validator is tested against.
    fn test_directory(&self) -> PathBuf;

    /// Glob patterns matched against file names during corpus discovery.
    fn file_patterns(&self) -> Vec<String> {
        vec!["*.json".to_string()]
    }

    /// Coarse adapter-level file filter, applied before the user's filter
    /// policy.
    fn should_include_file(&self, _path: &Path) -> bool {
        true
    }

    /// Parse a test file's raw content into a JSON document.
    fn decode(&self, content: &str) -> Result<Value> {
        Ok(serde_json::from_str(content)?)
    }

    /// Classify `data` against `schema`. May fail; the runner turns errors
    /// into failed results and keeps going.
    fn validate(&self, data: &Value, schema: &Value) -> Result<Verdict>;
}

/// The identifiers accepted by [`create`].
pub const ADAPTER_NAMES: &[&str] = &[builtin::ACCEPT_ALL, builtin::TYPECHECK];

/// Reconstruct an adapter from its identifier. This is the bootstrap path
/// for batch workers as well as the CLI.
pub fn create(name: &str, directory: Option<PathBuf>) -> Result<Box<dyn ValidatorAdapter>> {
    let directory = directory.unwrap_or_else(|| PathBuf::from("tests"));

    match name {
        builtin::ACCEPT_ALL => Ok(Box::new(builtin::AcceptAll::new(directory))),
        builtin::TYPECHECK => Ok(Box::new(builtin::TypeCheck::new(directory))),
        _ => bail!(
            "Unknown validator adapter '{name}'. Available adapters: {}",
            ADAPTER_NAMES.join(", ")
        ),
    }
}
