//! Parsers for PBS Pro command output.

use crate::error::{SchedError, SchedResult};
use crate::job::JobStatus;
use crate::status;

pub(crate) use crate::torque::parse_qsub_output;

/// Classify one line of default `qstat` output.
///
/// ```text
/// Job id            Name             User              Time Use S Queue
/// ----------------  ---------------- ----------------  -------- - -----
/// 12345.pbs-server  my_job           user              00:05:23 R workq
/// ```
pub fn parse_qstat_line(line: &str) -> SchedResult<JobStatus> {
    let code = status::status_column(line, 4)?;
    match code {
        "PD" => Ok(JobStatus::Queued),
        "R" | "T" | "E" => Ok(JobStatus::Running),
        "C" => Ok(JobStatus::Finished),
        other => Err(SchedError::StatusParse {
            code: other.to_string(),
            line: line.to_string(),
        }),
    }
}
