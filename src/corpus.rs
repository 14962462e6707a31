//! Loading and decoding of declarative test files.
//!
//! A test file is a JSON array of groups; each group carries a schema and a
//! `tests` array of cases. Real-world conformance corpora contain mixed and
//! partially malformed content, so the loader is deliberately tolerant:
//! anything that does not have the expected shape is dropped without
//! aborting the file, and the indices of the surviving items are preserved.

use anyhow::Result;
use serde_json::Value;
use std::path::Path;

/// A single assertion instance: input data plus the expected verdict.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub data: Value,
    pub expected_valid: bool,
    pub description: String,
    pub tags: Vec<String>,
    /// Optional name of the assertion strategy to apply to this case.
    pub assertion: Option<String>,
}

/// A batch of cases sharing one schema.
#[derive(Debug, Clone)]
pub struct TestGroup {
    /// Position of the group within the file's top level array.
    pub index: usize,
    pub description: String,
    /// Passed to the validator untouched. Missing schemas decode to `null`.
    pub schema: Value,
    /// Cases paired with their position in the original `tests` array. The
    /// index counts skipped entries, so it can have gaps.
    pub cases: Vec<(usize, TestCase)>,
}

const UNKNOWN_GROUP: &str = "Unknown group";
const UNKNOWN_TEST: &str = "Unknown test";

/// Read and decode one test file into its surviving groups.
///
/// Returns an empty list when the file cannot be read, the decoder fails, or
/// the decoded document is not an array. Malformed groups and cases are
/// skipped individually.
pub fn load_groups(path: &Path, decode: impl Fn(&str) -> Result<Value>) -> Vec<TestGroup> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!("skipping unreadable test file '{}': {err}", path.display());
            return Vec::new();
        }
    };

    let document = match decode(&content) {
        Ok(document) => document,
        Err(err) => {
            tracing::debug!("skipping undecodable test file '{}': {err:#}", path.display());
            return Vec::new();
        }
    };

    parse_document(path, document)
}

fn parse_document(path: &Path, document: Value) -> Vec<TestGroup> {
    let Value::Array(raw_groups) = document else {
        tracing::debug!("skipping test file '{}': top level is not an array", path.display());
        return Vec::new();
    };

    let mut groups = Vec::new();
    for (group_index, raw_group) in raw_groups.into_iter().enumerate() {
        let Some(group) = parse_group(group_index, raw_group) else {
            tracing::debug!("skipping group {group_index} in '{}'", path.display());
            continue;
        };

        groups.push(group);
    }

    groups
}

/// A group without an array-valued `tests` field is skipped entirely.
fn parse_group(index: usize, raw: Value) -> Option<TestGroup> {
    let Value::Object(mut fields) = raw else {
        return None;
    };

    let Some(Value::Array(raw_cases)) = fields.remove("tests") else {
        return None;
    };

    let description = match fields.remove("description") {
        Some(Value::String(description)) => description,
        _ => UNKNOWN_GROUP.to_string(),
    };

    let schema = fields.remove("schema").unwrap_or(Value::Null);

    let mut cases = Vec::new();
    for (case_index, raw_case) in raw_cases.into_iter().enumerate() {
        // Non-object cases are dropped but still consume their index.
        if let Some(case) = parse_case(raw_case) {
            cases.push((case_index, case));
        }
    }

    Some(TestGroup {
        index,
        description,
        schema,
        cases,
    })
}

fn parse_case(raw: Value) -> Option<TestCase> {
    let Value::Object(mut fields) = raw else {
        return None;
    };

    let description = match fields.remove("description") {
        Some(Value::String(description)) => description,
        _ => UNKNOWN_TEST.to_string(),
    };

    // Absent or non-boolean verdicts default to "expected invalid".
    let expected_valid = matches!(fields.remove("valid"), Some(Value::Bool(true)));

    let tags = match fields.remove("tags") {
        Some(Value::Array(tags)) => tags
            .into_iter()
            .filter_map(|tag| match tag {
                Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let assertion = match fields.remove("assertion") {
        Some(Value::String(assertion)) => Some(assertion),
        _ => None,
    };

    Some(TestCase {
        data: fields.remove("data").unwrap_or(Value::Null),
        expected_valid,
        description,
        tags,
        assertion,
    })
}

/// The number of well-formed cases in a file, without touching a validator.
pub fn count_cases(path: &Path, decode: impl Fn(&str) -> Result<Value>) -> usize {
    load_groups(path, decode)
        .iter()
        .map(|group| group.cases.len())
        .sum()
}
