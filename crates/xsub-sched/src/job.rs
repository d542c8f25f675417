//! Job types shared by every backend.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// Handle returned by a successful submission.
///
/// `job_id` is opaque: a numeric string for batch systems, a process id for
/// the local backend. It is only unique within one backend's live queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    pub raw_output: String,
}

/// Canonical job status.
///
/// Jobs move `Queued -> Running -> Finished`. `Finished` is terminal and is
/// also reported for jobs the backend no longer lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized status of one job plus the raw text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: JobStatus,
    /// The listing line that produced `status`, or a "not found" diagnostic.
    pub raw: String,
}

impl StatusEntry {
    pub fn new(status: JobStatus, raw: impl Into<String>) -> Self {
        Self {
            status,
            raw: raw.into(),
        }
    }

    /// Entry for a job id absent from the live listing.
    pub fn not_found(listing: &str) -> Self {
        Self::new(JobStatus::Finished, format!("not found in {listing}"))
    }
}

/// Input to script rendering.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    pub job_file: PathBuf,
    pub work_dir: PathBuf,
    pub log_dir: PathBuf,
    pub parameters: ParameterSet,
}

impl ScriptContext {
    pub fn new(
        job_file: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        parameters: ParameterSet,
    ) -> Self {
        Self {
            job_file: job_file.into(),
            work_dir: work_dir.into(),
            log_dir: log_dir.into(),
            parameters,
        }
    }
}
