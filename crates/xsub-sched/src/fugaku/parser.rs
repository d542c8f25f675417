//! Parsers for PJM command output.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SchedResult;
use crate::job::JobStatus;
use crate::status;

static SUBMITTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Job (\d+) submitted").unwrap());

/// Extract the job id from `pjsub` output.
///
/// ```text
/// [INFO] PJM 0000 pjsub Job 4180117 submitted.
/// ```
pub fn parse_pjsub_output(output: &str) -> Option<String> {
    SUBMITTED_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Classify one line of `pjstat` output.
///
/// ```text
///  JOB_ID     JOB_NAME   MD ST  USER     START_DATE      ELAPSE_LIM NODE_REQUIRE
///  4180117    parent.sh  NM RUN alice    10/19 10:00:00  0001:00:00 1
/// ```
///
/// PJM has many transitional states; anything outside the known sets is
/// treated as finished.
pub fn parse_pjstat_line(line: &str) -> SchedResult<JobStatus> {
    let code = status::status_column(line, 3)?;
    let status = match code {
        "ACC" | "QUE" => JobStatus::Queued,
        "RNA" | "RNP" | "RUN" | "RNE" | "RNO" | "SWO" | "SWD" | "SWI" | "HLD" => {
            JobStatus::Running
        }
        "EXT" | "RJT" | "CCL" => JobStatus::Finished,
        _ => JobStatus::Finished,
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pjsub_output() {
        assert_eq!(
            parse_pjsub_output("[INFO] PJM 0000 pjsub Job 4180117 submitted.\n"),
            Some("4180117".to_string())
        );
        assert_eq!(parse_pjsub_output("[ERR.] PJM 0007 pjsub Staging option error.\n"), None);
    }

    #[test]
    fn test_parse_pjstat_line() {
        let line = |code: &str| format!(" 4180117  parent.sh  NM {code}  alice  10/19 10:00:00  0001:00:00 1");
        for code in ["ACC", "QUE"] {
            assert_eq!(parse_pjstat_line(&line(code)).unwrap(), JobStatus::Queued);
        }
        for code in ["RNA", "RNP", "RUN", "RNE", "RNO", "SWO", "SWD", "SWI", "HLD"] {
            assert_eq!(parse_pjstat_line(&line(code)).unwrap(), JobStatus::Running);
        }
        for code in ["EXT", "RJT", "CCL", "ERR", "xyz"] {
            assert_eq!(parse_pjstat_line(&line(code)).unwrap(), JobStatus::Finished);
        }
    }

    #[test]
    fn test_parse_pjstat_line_without_status_column() {
        assert!(parse_pjstat_line("4180117 parent.sh").is_err());
    }
}
