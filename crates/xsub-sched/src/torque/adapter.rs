//! Torque adapter for job submission and tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::SchedulerAdapter;
use crate::error::SchedResult;
use crate::invoker::{self, CommandLine, CommandRunner, LogSink};
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::params::{self, ParameterSet, ParameterSpec};
use crate::registry::BackendKind;
use crate::status;
use crate::torque::{parser, templates};

/// Recognized parameters.
pub static PARAMETERS: &[ParameterSpec] = &[
    params::MPI_PROCS,
    params::OMP_THREADS,
    params::PPN,
    params::WALLTIME,
];

/// Adapter for the Torque resource manager.
pub struct TorqueAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl TorqueAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `qsub <script> -d <work_dir> -o <log_dir> -e <log_dir>`
    fn qsub_command(script_path: &Path, work_dir: &Path, log_dir: &Path) -> CommandLine {
        CommandLine::new("qsub")
            .path_arg(script_path)
            .arg("-d")
            .path_arg(work_dir)
            .arg("-o")
            .path_arg(log_dir)
            .arg("-e")
            .path_arg(log_dir)
    }
}

#[async_trait]
impl SchedulerAdapter for TorqueAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Torque
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        PARAMETERS
    }

    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()> {
        params::tiled_nodes(params).map(|_| ())
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        templates::generate_script(ctx)
    }

    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        log_dir: &Path,
        _params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        let command = Self::qsub_command(
            &invoker::absolute(script_path)?,
            &invoker::absolute(work_dir)?,
            &invoker::absolute(log_dir)?,
        );
        invoker::submit_job(self.runner.as_ref(), &command, log, parser::parse_qsub_output).await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        let jobs = invoker::list_jobs(self.runner.as_ref(), &CommandLine::new("qstat")).await?;
        let nodes = invoker::list_jobs(
            self.runner.as_ref(),
            &CommandLine::new("pbsnodes").arg("-a"),
        )
        .await?;

        let mut listing = jobs;
        if !listing.is_empty() && !listing.ends_with('\n') {
            listing.push('\n');
        }
        listing.push_str(&nodes);
        Ok(listing)
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        let output = invoker::list_jobs(self.runner.as_ref(), &CommandLine::new("qstat")).await?;
        status::normalize(&output, job_ids, "qstat", parser::parse_qstat_line)
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        let command = CommandLine::new("qdel").arg(job_id);
        invoker::cancel_job(self.runner.as_ref(), &command).await
    }
}
