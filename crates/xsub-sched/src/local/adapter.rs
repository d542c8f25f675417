//! Local adapter: background processes in their own process group.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::SchedulerAdapter;
use crate::error::SchedResult;
use crate::invoker::{self, CommandLine, CommandRunner, LogSink, shell_quote};
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::local::{parser, templates};
use crate::params::{self, ParameterSet, ParameterSpec};
use crate::registry::BackendKind;
use crate::status;

/// Recognized parameters. Accepted for interface parity; nothing consumes them.
pub static PARAMETERS: &[ParameterSpec] = &[params::MPI_PROCS, params::OMP_THREADS];

const PS_FORMAT: &str = "pid,stat,etime,args";

/// Adapter running jobs on the local host.
pub struct LocalAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl LocalAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn ps_command() -> CommandLine {
        CommandLine::new("ps").args(["-eo", PS_FORMAT])
    }

    /// Launch `bash <script>` detached, in a new process group, and echo its pid.
    fn launch_command(script_path: &Path, work_dir: &Path) -> CommandLine {
        let script = shell_quote(&script_path.display().to_string());
        CommandLine::new("bash")
            .arg("-c")
            .arg(format!(
                "set -m; nohup bash {script} > /dev/null 2>&1 < /dev/null & echo $!"
            ))
            .current_dir(work_dir)
    }
}

#[async_trait]
impl SchedulerAdapter for LocalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        PARAMETERS
    }

    fn check_semantics(&self, _params: &ParameterSet) -> SchedResult<()> {
        Ok(())
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        Ok(templates::generate_script(ctx))
    }

    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        _log_dir: &Path,
        _params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        let script_path = invoker::absolute(script_path)?;
        let work_dir = invoker::absolute(work_dir)?;
        tokio::fs::create_dir_all(&work_dir).await?;

        let command = Self::launch_command(&script_path, &work_dir);
        invoker::submit_job(self.runner.as_ref(), &command, log, parser::parse_launch_output).await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        invoker::list_jobs(self.runner.as_ref(), &Self::ps_command()).await
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        let output = invoker::list_jobs(self.runner.as_ref(), &Self::ps_command()).await?;
        status::normalize(&output, job_ids, "ps", parser::parse_ps_line)
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        let pid = parser::parse_pid(job_id)?;
        let command = CommandLine::new("kill").args(["-TERM", "--"]).arg(format!("-{pid}"));
        invoker::cancel_job(self.runner.as_ref(), &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedError;
    use crate::invoker::{CommandOutput, MockRunner};
    use crate::job::JobStatus;

    fn adapter(runner: MockRunner) -> (LocalAdapter, Arc<MockRunner>) {
        let runner = Arc::new(runner);
        (LocalAdapter::new(runner.clone()), runner)
    }

    #[test]
    fn test_defaults_validate() {
        let (adapter, _) = adapter(MockRunner::new());
        adapter
            .validate_parameters(&ParameterSet::defaults(PARAMETERS))
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_launches_detached_process() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("work");
        let (adapter, runner) = adapter(MockRunner::new().respond_ok("31337\n"));
        let mut log = Vec::new();

        let handle = adapter
            .submit(
                &dir.path().join("parent.sh"),
                &work_dir,
                dir.path(),
                &ParameterSet::defaults(PARAMETERS),
                &mut log,
            )
            .await
            .unwrap();

        assert_eq!(handle.job_id, "31337");
        assert!(work_dir.is_dir());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "bash");
        assert!(calls[0].args[1].starts_with("set -m; nohup bash "));
        assert!(calls[0].args[1].ends_with("& echo $!"));
        assert_eq!(calls[0].current_dir.as_deref(), Some(work_dir.as_path()));
        assert!(String::from_utf8(log).unwrap().contains("job_id: 31337"));
    }

    #[tokio::test]
    async fn test_query_statuses_uses_ps() {
        let listing = "    PID STAT     ELAPSED COMMAND\n      1 Ss    1:00:00 init\n  31337 S       00:02 bash /tmp/parent.sh\n  31338 Z       00:02 [bash] <defunct>\n";
        let (adapter, runner) = adapter(MockRunner::new().respond_ok(listing));
        let ids: BTreeSet<String> = ["31337", "31338", "4"].iter().map(|s| s.to_string()).collect();

        let result = adapter.query_statuses(&ids).await.unwrap();
        assert_eq!(result["31337"].status, JobStatus::Running);
        assert_eq!(result["31338"].status, JobStatus::Finished);
        assert_eq!(result["4"].status, JobStatus::Finished);
        assert_eq!(result["4"].raw, "not found in ps");
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.calls()[0].to_string(), "ps -eo pid,stat,etime,args");
    }

    #[tokio::test]
    async fn test_cancel_kills_process_group() {
        let (adapter, runner) = adapter(MockRunner::new());
        adapter.cancel("31337").await.unwrap();
        assert_eq!(runner.calls()[0].to_string(), "kill -TERM -- -31337");

        let err = adapter.cancel("abc").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_failure() {
        let (adapter, _) = adapter(
            MockRunner::new().respond(CommandOutput::failed(1, "", "kill: (-31337): No such process")),
        );
        let err = adapter.cancel("31337").await.unwrap_err();
        assert!(matches!(err, SchedError::CancelFailed { .. }));
    }
}
