//! Status normalization over bulk listing output.
//!
//! Every backend lists its live jobs with one command. For each requested id
//! the *last* line whose leading token names that id is classified by the
//! backend's parser; ids with no such line are reported as finished.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{SchedError, SchedResult};
use crate::job::{JobStatus, StatusEntry};

/// Whether `line` starts with `job_id`.
///
/// The leading token must equal the id, optionally followed by a server
/// suffix (`1234.pbs01`) or an array index (`1234[3]`, `1234_3`).
pub fn line_matches(line: &str, job_id: &str) -> bool {
    let Some(token) = line.split_whitespace().next() else {
        return false;
    };
    match token.strip_prefix(job_id) {
        Some("") => true,
        Some(rest) => rest.starts_with(['.', '[', '_']),
        None => false,
    }
}

/// Extract the whitespace-separated column `index` (0-based) from a line.
pub fn status_column(line: &str, index: usize) -> SchedResult<&str> {
    line.split_whitespace()
        .nth(index)
        .ok_or_else(|| SchedError::StatusParse {
            code: String::new(),
            line: line.to_string(),
        })
}

/// Normalize a bulk listing for a set of job ids.
///
/// `listing` names the command that produced `output`, for the "not found"
/// diagnostic. `classify` maps one matched line to a canonical status.
pub fn normalize<F>(
    output: &str,
    job_ids: &BTreeSet<String>,
    listing: &str,
    classify: F,
) -> SchedResult<BTreeMap<String, StatusEntry>>
where
    F: Fn(&str) -> SchedResult<JobStatus>,
{
    let lines: Vec<&str> = output.lines().collect();
    let mut results = BTreeMap::new();

    for job_id in job_ids {
        let entry = match lines.iter().rev().find(|line| line_matches(line, job_id)) {
            Some(line) => StatusEntry::new(classify(line)?, line.trim_end()),
            None => StatusEntry::not_found(listing),
        };
        results.insert(job_id.clone(), entry);
    }

    Ok(results)
}
