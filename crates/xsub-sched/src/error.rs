//! Error handling for scheduler adapters.

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur during scheduler operations.
///
/// Nothing in this crate retries or downgrades an error; every variant that
/// comes from a subprocess carries the command line and the captured output.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Missing or unknown backend selection.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A submission parameter failed a syntactic or semantic check.
    #[error("Invalid parameter '{parameter}': {message}")]
    Validation { parameter: String, message: String },

    /// The submit command exited with a nonzero return code.
    #[error("Submission failed (rc={code:?}): {command}\n{output}")]
    SubmitFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// The submit command succeeded but its output had no job id.
    #[error("Failed to get job id from `{command}`:\n{output}")]
    JobIdMissing { command: String, output: String },

    /// A status line carried a code outside the backend's known set.
    #[error("Unknown status code '{code}' in line: {line}")]
    StatusParse { code: String, line: String },

    /// The cancel command exited with a nonzero return code.
    #[error("Cancellation failed (rc={code:?}): {command}\n{output}")]
    CancelFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// A listing command exited with a nonzero return code.
    #[error("Command failed (rc={code:?}): {command}\n{output}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// The program could not be started at all.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SchedError {
    /// Shorthand for a validation failure on one parameter.
    pub fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        SchedError::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised before any subprocess ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, SchedError::Validation { .. })
    }

    /// Whether the error belongs to the submission family (nonzero rc or no job id).
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            SchedError::SubmitFailed { .. } | SchedError::JobIdMissing { .. }
        )
    }
}
