//! SLURM adapter for job submission and tracking.

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
use crate::slurm::{parser, templates};
use crate::status;

/// Recognized parameters.
pub static PARAMETERS: &[ParameterSpec] = &[
    params::MPI_PROCS,
    params::OMP_THREADS,
    params::PPN,
    params::WALLTIME,
];

/// Adapter for the SLURM workload manager.
pub struct SlurmAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl SlurmAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `sbatch -D <work_dir> -o <log_dir>/xsub.log -e <log_dir>/xsub.log <script>`
    fn sbatch_command(script_path: &Path, work_dir: &Path, log_dir: &Path) -> CommandLine {
        let log_file = log_dir.join("xsub.log");
        CommandLine::new("sbatch")
            .arg("-D")
            .path_arg(work_dir)
            .arg("-o")
            .path_arg(&log_file)
            .arg("-e")
            .path_arg(&log_file)
            .path_arg(script_path)
    }
}

#[async_trait]
impl SchedulerAdapter for SlurmAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Slurm
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        PARAMETERS
    }

    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()> {
        params::tiled_nodes(params).map(|_| ())
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        templates::generate_batch_script(ctx)
    }

    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        log_dir: &Path,
        _params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        let command = Self::sbatch_command(
            &invoker::absolute(script_path)?,
            &invoker::absolute(work_dir)?,
            &invoker::absolute(log_dir)?,
        );
        invoker::submit_job(self.runner.as_ref(), &command, log, parser::parse_sbatch_output)
            .await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        invoker::list_jobs(self.runner.as_ref(), &CommandLine::new("squeue")).await
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        let output = invoker::list_jobs(self.runner.as_ref(), &CommandLine::new("squeue")).await?;
        status::normalize(&output, job_ids, "squeue", parser::parse_squeue_line)
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        let command = CommandLine::new("scancel").arg(job_id);
        invoker::cancel_job(self.runner.as_ref(), &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedError;
    use crate::invoker::{CommandOutput, MockRunner};
    use crate::job::JobStatus;

    const SQUEUE: &str = "\
             JOBID PARTITION     NAME     USER ST       TIME  NODES NODELIST(REASON)
              2001     batch    relax    alice PD       0:00      2 (Resources)
              2002     batch      scf    alice  R      12:01      1 node07
              2002     batch      scf    alice  E      12:02      1 node07
";

    fn adapter(runner: MockRunner) -> (SlurmAdapter, Arc<MockRunner>) {
        let runner = Arc::new(runner);
        (SlurmAdapter::new(runner.clone()), runner)
    }

    #[tokio::test]
    async fn test_submit() {
        let (adapter, runner) = adapter(MockRunner::new().respond_ok("Submitted batch job 2003\n"));
        let mut log = Vec::new();

        let handle = adapter
            .submit(
                Path::new("/scratch/log/parent.sh"),
                Path::new("/scratch"),
                Path::new("/scratch/log"),
                &ParameterSet::defaults(PARAMETERS),
                &mut log,
            )
            .await
            .unwrap();

        assert_eq!(handle.job_id, "2003");
        assert_eq!(
            runner.calls()[0].to_string(),
            "sbatch -D /scratch -o /scratch/log/xsub.log -e /scratch/log/xsub.log /scratch/log/parent.sh"
        );
        let log = String::from_utf8(log).unwrap();
        assert!(log.starts_with("cmd: sbatch -D /scratch"));
        assert!(log.contains("job_id: 2003"));
    }

    #[tokio::test]
    async fn test_submit_unparsable_output() {
        let (adapter, _) = adapter(MockRunner::new().respond_ok("sbatch: queued under maintenance\n"));
        let mut log = Vec::new();
        let err = adapter
            .submit(
                Path::new("/scratch/parent.sh"),
                Path::new("/scratch"),
                Path::new("/scratch"),
                &ParameterSet::defaults(PARAMETERS),
                &mut log,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedError::JobIdMissing { .. }));
    }

    #[tokio::test]
    async fn test_query_statuses() {
        let (adapter, runner) = adapter(MockRunner::new().respond_ok(SQUEUE));
        let ids: BTreeSet<String> = ["2001", "2002", "1999"].iter().map(|s| s.to_string()).collect();

        let result = adapter.query_statuses(&ids).await.unwrap();
        assert_eq!(result["2001"].status, JobStatus::Queued);
        assert_eq!(result["2002"].status, JobStatus::Running);
        assert!(result["2002"].raw.contains("12:02"));
        assert_eq!(result["1999"].status, JobStatus::Finished);
        assert_eq!(result["1999"].raw, "not found in squeue");
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_query_statuses_listing_failure() {
        let (adapter, _) = adapter(
            MockRunner::new().respond(CommandOutput::failed(1, "", "slurm_load_jobs error: Unable to contact slurm controller")),
        );
        let ids: BTreeSet<String> = ["2001".to_string()].into_iter().collect();
        let err = adapter.query_statuses(&ids).await.unwrap_err();
        assert!(matches!(err, SchedError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_cancel() {
        let (adapter, runner) = adapter(MockRunner::new());
        adapter.cancel("2001").await.unwrap();
        assert_eq!(runner.calls()[0].to_string(), "scancel 2001");
    }
}
