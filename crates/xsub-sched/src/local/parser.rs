//! Parsers for local process output.

use crate::error::{SchedError, SchedResult};
use crate::job::JobStatus;
use crate::status;

/// Parse the process id echoed after launching the job.
///
/// The launcher prints `$!` last; earlier lines (if any) are ignored.
pub fn parse_launch_output(output: &str) -> Option<String> {
    let last = output.lines().rev().find(|l| !l.trim().is_empty())?;
    last.trim().parse::<u32>().ok().map(|pid| pid.to_string())
}

/// Classify one `ps -eo pid,stat,...` line. Zombies have exited.
pub fn parse_ps_line(line: &str) -> SchedResult<JobStatus> {
    let stat = status::status_column(line, 1)?;
    if stat.starts_with('Z') {
        Ok(JobStatus::Finished)
    } else {
        Ok(JobStatus::Running)
    }
}

/// Local job ids must be plain process ids.
pub fn parse_pid(job_id: &str) -> SchedResult<u32> {
    job_id
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid > 1)
        .ok_or_else(|| SchedError::invalid("job_id", format!("'{job_id}' is not a process id")))
}
