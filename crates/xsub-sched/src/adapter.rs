//! The contract every scheduler backend implements.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;

use crate::error::SchedResult;
use crate::invoker::LogSink;
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::params::{self, ParameterSet, ParameterSpec};
use crate::registry::BackendKind;

/// Trait for scheduler backends.
#[async_trait]
pub trait SchedulerAdapter: Send + Sync {
    /// Registry name of this backend.
    fn kind(&self) -> BackendKind;

    /// Recognized submission parameters.
    fn parameter_specs(&self) -> &'static [ParameterSpec];

    /// Backend-specific checks that span several parameters.
    ///
    /// Only called after every value has passed its own pattern.
    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()>;

    /// Validate a parameter set with defaults already merged. Pure.
    fn validate_parameters(&self, params: &ParameterSet) -> SchedResult<()> {
        params::check_syntax(self.parameter_specs(), params)?;
        self.check_semantics(params)
    }

    /// Render the parent script wrapping the job file. Pure and deterministic.
    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String>;

    /// Submit a rendered script.
    ///
    /// `params` must have passed [`validate_parameters`](Self::validate_parameters).
    /// The command line and its raw output are written to `log`.
    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        log_dir: &Path,
        params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle>;

    /// Raw, human-facing listing of all jobs.
    async fn query_all_status(&self) -> SchedResult<String>;

    /// Status of several jobs from a single listing command.
    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>>;

    /// Ask the backend to cancel one job.
    async fn cancel(&self, job_id: &str) -> SchedResult<String>;
}
