//! Parsers for Torque command output.

use crate::error::{SchedError, SchedResult};
use crate::job::JobStatus;
use crate::status;

/// Parse qsub output to extract the numeric job id.
///
/// qsub prints the full id on its last line, usually with the server name
/// appended (`12345.server.domain.com`). Only the leading number is kept.
pub fn parse_qsub_output(output: &str) -> Option<String> {
    let last = output.lines().rev().find(|l| !l.trim().is_empty())?;
    let token = last.split_whitespace().last()?;
    let number = token.split('.').next()?;

    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        Some(number.to_string())
    } else {
        None
    }
}

/// Classify one line of default `qstat` output.
///
/// ```text
/// Job ID                    Name             User            Time Use S Queue
/// ------------------------- ---------------- --------------- -------- - -----
/// 12345.server              my_job           user            00:05:23 R batch
/// ```
pub fn parse_qstat_line(line: &str) -> SchedResult<JobStatus> {
    let code = status::status_column(line, 4)?;
    match code {
        "Q" => Ok(JobStatus::Queued),
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
    fn test_parse_qsub_output() {
        assert_eq!(parse_qsub_output("12345.pbs-server\n"), Some("12345".to_string()));
        assert_eq!(parse_qsub_output("999999.cluster.local"), Some("999999".to_string()));
        assert_eq!(parse_qsub_output("12345"), Some("12345".to_string()));
        assert_eq!(
            parse_qsub_output("warning: defaults used\n4711.head\n"),
            Some("4711".to_string())
        );
    }

    #[test]
    fn test_parse_qsub_output_error() {
        assert_eq!(parse_qsub_output("qsub: Unknown queue"), None);
        assert_eq!(parse_qsub_output(""), None);
    }

    #[test]
    fn test_parse_qstat_line() {
        let line = |code: &str| format!("12345.server  my_job  user  00:05:23 {code} batch");
        assert_eq!(parse_qstat_line(&line("Q")).unwrap(), JobStatus::Queued);
        for code in ["R", "T", "E"] {
            assert_eq!(parse_qstat_line(&line(code)).unwrap(), JobStatus::Running);
        }
        assert_eq!(parse_qstat_line(&line("C")).unwrap(), JobStatus::Finished);
    }

    #[test]
    fn test_parse_qstat_line_unknown_code() {
        let err = parse_qstat_line("12345.server my_job user 00:00:00 H batch").unwrap_err();
        match err {
            SchedError::StatusParse { code, .. } => assert_eq!(code, "H"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_qstat_line("12345.server my_job").is_err());
    }
}
