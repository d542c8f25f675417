//! Parsers for SLURM command output.

use crate::error::{SchedError, SchedResult};
use crate::job::JobStatus;
use crate::status;

/// Parse sbatch output to extract the job id.
///
/// sbatch output format: "Submitted batch job 12345"
pub fn parse_sbatch_output(output: &str) -> Option<String> {
    let last = output.lines().rev().find(|l| !l.trim().is_empty())?;
    let job_id = last.split_whitespace().last()?;

    if job_id.chars().all(|c| c.is_ascii_digit()) {
        Some(job_id.to_string())
    } else {
        None
    }
}

/// Classify one line of default `squeue` output.
///
/// ```text
///   JOBID PARTITION     NAME     USER ST       TIME  NODES NODELIST(REASON)
///   12345     batch   my_job     user  R       5:23      2 node[01-02]
/// ```
pub fn parse_squeue_line(line: &str) -> SchedResult<JobStatus> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sbatch_output() {
        assert_eq!(parse_sbatch_output("Submitted batch job 12345\n"), Some("12345".to_string()));
        assert_eq!(parse_sbatch_output("Submitted batch job 9999999"), Some("9999999".to_string()));
    }

    #[test]
    fn test_parse_sbatch_output_error() {
        assert_eq!(parse_sbatch_output("Error: some error message"), None);
        assert_eq!(parse_sbatch_output(""), None);
    }

    #[test]
    fn test_parse_squeue_line() {
        let line = |code: &str| format!("  12345  batch  my_job  user  {code}  5:23  2 node[01-02]");
        assert_eq!(parse_squeue_line(&line("PD")).unwrap(), JobStatus::Queued);
        for code in ["R", "T", "E"] {
            assert_eq!(parse_squeue_line(&line(code)).unwrap(), JobStatus::Running);
        }
        assert_eq!(parse_squeue_line(&line("C")).unwrap(), JobStatus::Finished);
    }

    #[test]
    fn test_parse_squeue_line_unknown_code() {
        let err = parse_squeue_line("12345 batch my_job user CG 0:01 1 node01").unwrap_err();
        assert!(matches!(err, SchedError::StatusParse { code, .. } if code == "CG"));
    }
}
