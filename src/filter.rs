//! File and case selection policies.
//!
//! The filter configuration is plain data so the parent process can ship it
//! to batch workers on their command line; workers compile it back into a
//! policy and apply it themselves, which keeps parallel runs equivalent to
//! sequential ones.

use crate::suite::TestResult;
use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The serializable filter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Glob pattern matched against the full test file path.
    pub path_glob: Option<String>,
    /// Regex matched against the composed case name `<group> - <description>`.
    pub name_regex: Option<String>,
    /// Regex that removes matching cases. Takes precedence over the other
    /// case filters.
    pub exclude_regex: Option<String>,
    /// Exact tag a case must carry.
    pub tag: Option<String>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.path_glob.is_none() && self.name_regex.is_none() && self.exclude_regex.is_none() && self.tag.is_none()
    }

    /// Compile the patterns. Invalid regexes and globs are configuration
    /// errors and surface to the caller.
    pub fn compile(&self) -> Result<FilterPolicy> {
        let path_glob = self
            .path_glob
            .as_ref()
            .map(|pattern| {
                Glob::new(pattern)
                    .map(|glob| glob.compile_matcher())
                    .with_context(|| format!("Could not parse the path glob pattern '{pattern}'"))
            })
            .transpose()?;

        Ok(FilterPolicy {
            path_glob,
            name_regex: compile_regex(self.name_regex.as_deref(), "filter")?,
            exclude_regex: compile_regex(self.exclude_regex.as_deref(), "exclude")?,
            tag: self.tag.clone(),
        })
    }
}

fn compile_regex(pattern: Option<&str>, role: &str) -> Result<Option<Regex>> {
    pattern
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Could not parse the {role} regular expression '{pattern}'"))
        })
        .transpose()
}

/// The compiled form of [`FilterConfig`].
#[derive(Debug, Default)]
pub struct FilterPolicy {
    path_glob: Option<GlobMatcher>,
    name_regex: Option<Regex>,
    exclude_regex: Option<Regex>,
    tag: Option<String>,
}

impl FilterPolicy {
    pub fn should_include_file(&self, path: &Path) -> bool {
        self.path_glob.as_ref().is_none_or(|glob| glob.is_match(path))
    }

    /// Case inclusion. The exclude regex dominates, then the tag must match
    /// exactly, then the name regex must match.
    pub fn should_include_case(&self, result: &TestResult) -> bool {
        let name = format!("{} - {}", result.group, result.description);

        if let Some(exclude) = &self.exclude_regex
            && exclude.is_match(&name)
        {
            return false;
        }

        if let Some(tag) = &self.tag
            && !result.tags.iter().any(|candidate| candidate == tag)
        {
            return false;
        }

        self.name_regex.as_ref().is_none_or(|regex| regex.is_match(&name))
    }
}
