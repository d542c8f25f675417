//! PBS Pro adapter for job submission and tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::SchedulerAdapter;
use crate::error::SchedResult;
use crate::invoker::{self, CommandLine, CommandRunner, LogSink};
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::params::{self, BOOLEAN, Constraint, ParameterSet, ParameterSpec, WORD};
use crate::pbs::{parser, templates};
use crate::registry::BackendKind;
use crate::status;

/// Recognized parameters.
pub static PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "account_name",
        description: "Account name",
        default: "",
        constraint: Constraint::Pattern(WORD),
    },
    params::MPI_PROCS,
    params::OMP_THREADS,
    params::PPN,
    params::WALLTIME,
    ParameterSpec {
        name: "partition",
        description: "Partition (queue) name",
        default: "",
        constraint: Constraint::Pattern(WORD),
    },
    ParameterSpec {
        name: "exclusive",
        description: "Exclusive node placement",
        default: "false",
        constraint: Constraint::Options(BOOLEAN),
    },
];

/// Adapter for Altair PBS Pro.
pub struct PbsProAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl PbsProAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `qsub -o <log_dir>/xsub.log -e <log_dir>/xsub.log <script>`
    ///
    /// The working directory is entered by the script itself.
    fn qsub_command(script_path: &Path, log_dir: &Path) -> CommandLine {
        let log_file = log_dir.join("xsub.log");
        CommandLine::new("qsub")
            .arg("-o")
            .path_arg(&log_file)
            .arg("-e")
            .path_arg(&log_file)
            .path_arg(script_path)
    }

    fn qstat_command() -> CommandLine {
        CommandLine::new("qstat")
    }
}

#[async_trait]
impl SchedulerAdapter for PbsProAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::PbsPro
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        PARAMETERS
    }

    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()> {
        params::tiled_nodes(params).map(|_| ())
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        templates::generate_pbs_script(ctx)
    }

    async fn submit(
        &self,
        script_path: &Path,
        _work_dir: &Path,
        log_dir: &Path,
        _params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        let command = Self::qsub_command(
            &invoker::absolute(script_path)?,
            &invoker::absolute(log_dir)?,
        );
        invoker::submit_job(self.runner.as_ref(), &command, log, parser::parse_qsub_output).await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        invoker::list_jobs(self.runner.as_ref(), &Self::qstat_command()).await
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        let output = invoker::list_jobs(self.runner.as_ref(), &Self::qstat_command()).await?;
        status::normalize(&output, job_ids, "qstat", parser::parse_qstat_line)
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        let command = CommandLine::new("qdel").arg(job_id);
        invoker::cancel_job(self.runner.as_ref(), &command).await
    }
}
