//! Fugaku (PJM) adapter for job submission and tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::SchedulerAdapter;
use crate::error::{SchedError, SchedResult};
use crate::fugaku::{parser, templates};
use crate::invoker::{self, CommandLine, CommandRunner, LogSink};
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::params::{
    self, BOOLEAN, Constraint, DURATION, POSITIVE_INT, ParameterSet, ParameterSpec, SHAPE,
};
use crate::registry::BackendKind;
use crate::status;

/// Recognized parameters.
pub static PARAMETERS: &[ParameterSpec] = &[
    params::MPI_PROCS,
    ParameterSpec {
        name: "max_mpi_procs_per_node",
        description: "Max MPI processes per node",
        default: "1",
        constraint: Constraint::Pattern(POSITIVE_INT),
    },
    params::OMP_THREADS,
    ParameterSpec {
        name: "elapse",
        description: "Limit on elapsed time",
        default: "1:00:00",
        constraint: Constraint::Pattern(DURATION),
    },
    ParameterSpec {
        name: "node",
        description: "Nodes",
        default: "1",
        constraint: Constraint::Pattern(SHAPE),
    },
    ParameterSpec {
        name: "shape",
        description: "Shape",
        default: "1",
        constraint: Constraint::Pattern(SHAPE),
    },
    ParameterSpec {
        name: "low_priority_job",
        description: "Low priority job(s)?",
        default: "false",
        constraint: Constraint::Options(BOOLEAN),
    },
];

/// Cores available to one Fugaku node.
const CORES_PER_NODE: u64 = 48;

const SMALL_NODES: u64 = 384;
const LARGE_NODES: u64 = 55_296;
const HOURS: u64 = 3600;

/// Resource group for a job of `nodes` nodes running at most `elapse_secs`.
///
/// Returns `None` when no group admits the combination.
pub fn resource_group(nodes: u64, elapse_secs: u64, low_priority: bool) -> Option<&'static str> {
    if low_priority {
        if nodes <= SMALL_NODES && elapse_secs <= 12 * HOURS {
            Some("small-free")
        } else if nodes <= LARGE_NODES && elapse_secs <= 12 * HOURS {
            Some("large-free")
        } else {
            None
        }
    } else if nodes <= SMALL_NODES && elapse_secs <= 72 * HOURS {
        Some("small")
    } else if nodes <= LARGE_NODES && elapse_secs <= 24 * HOURS {
        Some("large")
    } else {
        None
    }
}

/// Resolve the resource group from a parameter set.
fn resolve_rscgrp(params: &ParameterSet) -> SchedResult<&'static str> {
    let node = params.require("node")?;
    let elapse = params.require("elapse")?;
    let nodes = params::shape_total("node", &params::shape_dims("node", node)?)?;
    let elapse_secs = params::duration_secs("elapse", elapse)?;
    let low_priority = params.require_flag("low_priority_job")?;

    resource_group(nodes, elapse_secs, low_priority).ok_or_else(|| {
        // Every group up to LARGE_NODES admits some shorter elapse.
        let parameter = if nodes <= LARGE_NODES { "elapse" } else { "node" };
        SchedError::invalid(
            parameter,
            format!(
                "no resource group admits node={node} elapse={elapse} low_priority_job={low_priority}"
            ),
        )
    })
}

/// Adapter for Fujitsu PJM on Fugaku.
pub struct FugakuAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl FugakuAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `cd <work_dir> && pjsub <script> -o <log>/%j.o.txt -e <log>/%j.e.txt --spath <log>/%j.i.txt`
    fn pjsub_command(script_path: &Path, work_dir: &Path, log_dir: &Path) -> CommandLine {
        CommandLine::new("pjsub")
            .path_arg(script_path)
            .arg("-o")
            .path_arg(&log_dir.join("%j.o.txt"))
            .arg("-e")
            .path_arg(&log_dir.join("%j.e.txt"))
            .arg("--spath")
            .path_arg(&log_dir.join("%j.i.txt"))
            .current_dir(work_dir)
    }
}

#[async_trait]
impl SchedulerAdapter for FugakuAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Fugaku
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        PARAMETERS
    }

    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()> {
        let mpi = params.require_u64("mpi_procs")?;
        let omp = params.require_u64("omp_threads")?;
        if mpi < 1 || omp < 1 {
            return Err(SchedError::invalid(
                "mpi_procs",
                "mpi_procs and omp_threads must be larger than or equal to 1",
            ));
        }

        let node = params::shape_dims("node", params.require("node")?)?;
        let shape = params::shape_dims("shape", params.require("shape")?)?;
        if node.len() != shape.len() {
            return Err(SchedError::invalid(
                "shape",
                "node and shape must have the same format, e.g. node=4x3 shape=1x1",
            ));
        }
        if node.iter().zip(&shape).any(|(n, s)| n < s) {
            return Err(SchedError::invalid(
                "shape",
                "each dimension of node must be at least the one in shape",
            ));
        }

        let max_per_node = params.require_u64("max_mpi_procs_per_node")?;
        if params::checked_product("max_mpi_procs_per_node", max_per_node, omp)? > CORES_PER_NODE {
            return Err(SchedError::invalid(
                "max_mpi_procs_per_node",
                format!(
                    "max_mpi_procs_per_node times omp_threads must be less than or equal to {CORES_PER_NODE}"
                ),
            ));
        }

        let shape_total = params::shape_total("shape", &shape)?;
        let max_procs = params::checked_product("mpi_procs", shape_total, max_per_node)?;
        if mpi > max_procs {
            return Err(SchedError::invalid(
                "mpi_procs",
                format!("mpi_procs must be less than or equal to {max_procs}"),
            ));
        }

        resolve_rscgrp(params).map(|_| ())
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        let rscgrp = resolve_rscgrp(&ctx.parameters)?;
        debug!(rscgrp, "resolved Fugaku resource group");
        templates::generate_pjm_script(ctx, rscgrp)
    }

    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        log_dir: &Path,
        _params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        let command = Self::pjsub_command(
            &invoker::absolute(script_path)?,
            &invoker::absolute(work_dir)?,
            &invoker::absolute(log_dir)?,
        );
        invoker::submit_job(self.runner.as_ref(), &command, log, parser::parse_pjsub_output).await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        let command = CommandLine::new("pjstat").arg("--with-summary");
        invoker::list_jobs(self.runner.as_ref(), &command).await
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        let output = invoker::list_jobs(self.runner.as_ref(), &CommandLine::new("pjstat")).await?;
        status::normalize(&output, job_ids, "pjstat", parser::parse_pjstat_line)
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        let command = CommandLine::new("pjdel").arg(job_id);
        invoker::cancel_job(self.runner.as_ref(), &command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::MockRunner;
    use crate::job::JobStatus;

    fn adapter(runner: MockRunner) -> (FugakuAdapter, Arc<MockRunner>) {
        let runner = Arc::new(runner);
        (FugakuAdapter::new(runner.clone()), runner)
    }

    fn validate(params: &ParameterSet) -> SchedResult<()> {
        FugakuAdapter::new(Arc::new(MockRunner::new())).validate_parameters(params)
    }

    #[test]
    fn test_resource_group_table() {
        assert_eq!(resource_group(384, 12 * HOURS, true), Some("small-free"));
        assert_eq!(resource_group(385, 12 * HOURS, true), Some("large-free"));
        assert_eq!(resource_group(55_296, 12 * HOURS, true), Some("large-free"));
        assert_eq!(resource_group(1, 12 * HOURS + 1, true), None);
        assert_eq!(resource_group(384, 72 * HOURS, false), Some("small"));
        assert_eq!(resource_group(385, 24 * HOURS, false), Some("large"));
        assert_eq!(resource_group(385, 24 * HOURS + 1, false), None);
        assert_eq!(resource_group(60_000, HOURS, false), None);
    }

    #[test]
    fn test_rscgrp_from_parameters() {
        let base = ParameterSet::defaults(PARAMETERS)
            .with("elapse", "12:00:00")
            .with("low_priority_job", "true");

        let params = base.clone().with("node", "384").with("shape", "1");
        assert_eq!(resolve_rscgrp(&params).unwrap(), "small-free");

        let params = base.clone().with("node", "55296").with("shape", "1");
        assert_eq!(resolve_rscgrp(&params).unwrap(), "large-free");

        let params = base
            .with("node", "60000")
            .with("shape", "1")
            .with("low_priority_job", "false");
        let err = validate(&params).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("no resource group"));
    }

    #[test]
    fn test_unassignable_rscgrp_names_limiting_parameter() {
        let params = ParameterSet::defaults(PARAMETERS).with("elapse", "100:00:00");
        match validate(&params).unwrap_err() {
            SchedError::Validation { parameter, .. } => assert_eq!(parameter, "elapse"),
            other => panic!("unexpected error: {other}"),
        }

        let params = ParameterSet::defaults(PARAMETERS)
            .with("low_priority_job", "true")
            .with("elapse", "12:00:01");
        match validate(&params).unwrap_err() {
            SchedError::Validation { parameter, .. } => assert_eq!(parameter, "elapse"),
            other => panic!("unexpected error: {other}"),
        }

        let params = ParameterSet::defaults(PARAMETERS).with("node", "60000");
        match validate(&params).unwrap_err() {
            SchedError::Validation { parameter, .. } => assert_eq!(parameter, "node"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_validate() {
        validate(&ParameterSet::defaults(PARAMETERS)).unwrap();
    }

    #[test]
    fn test_node_shape_rules() {
        let params = ParameterSet::defaults(PARAMETERS)
            .with("node", "4x3")
            .with("shape", "2");
        assert!(validate(&params).unwrap_err().to_string().contains("same format"));

        let params = ParameterSet::defaults(PARAMETERS)
            .with("node", "4x3")
            .with("shape", "2x4");
        assert!(validate(&params).unwrap_err().to_string().contains("at least"));

        let params = ParameterSet::defaults(PARAMETERS)
            .with("node", "4x3x2")
            .with("shape", "4x3x2");
        validate(&params).unwrap();
    }

    #[test]
    fn test_process_limits() {
        let params = ParameterSet::defaults(PARAMETERS)
            .with("max_mpi_procs_per_node", "12")
            .with("omp_threads", "4");
        validate(&params).unwrap();

        let params = params.with("omp_threads", "5");
        let err = validate(&params).unwrap_err();
        assert!(err.to_string().contains("less than or equal to 48"));

        let params = ParameterSet::defaults(PARAMETERS)
            .with("node", "2x2")
            .with("shape", "2x2")
            .with("max_mpi_procs_per_node", "4")
            .with("mpi_procs", "17");
        let err = validate(&params).unwrap_err();
        assert!(err.to_string().contains("less than or equal to 16"));
    }

    #[test]
    fn test_render_script_uses_rscgrp() {
        let (adapter, _) = adapter(MockRunner::new());
        let params = ParameterSet::defaults(PARAMETERS)
            .with("node", "1000")
            .with("elapse", "24:00:00");
        let ctx = ScriptContext::new("/vol/job.sh", "/vol", "/vol/log", params);
        let script = adapter.render_script(&ctx).unwrap();
        assert!(script.contains("#PJM --rsc-list \"rscgrp=large\"\n"));
        assert!(script.ends_with(". /vol/job.sh\n"));
    }

    #[tokio::test]
    async fn test_submit() {
        let (adapter, runner) = adapter(
            MockRunner::new().respond_ok("[INFO] PJM 0000 pjsub Job 4180117 submitted.\n"),
        );
        let mut log = Vec::new();

        let handle = adapter
            .submit(
                Path::new("/vol/u/log/parent.sh"),
                Path::new("/vol/u"),
                Path::new("/vol/u/log"),
                &ParameterSet::defaults(PARAMETERS),
                &mut log,
            )
            .await
            .unwrap();

        assert_eq!(handle.job_id, "4180117");
        assert_eq!(
            runner.calls()[0].to_string(),
            "cd /vol/u && pjsub /vol/u/log/parent.sh -o /vol/u/log/%j.o.txt -e /vol/u/log/%j.e.txt --spath /vol/u/log/%j.i.txt"
        );
    }

    #[tokio::test]
    async fn test_query_statuses() {
        let listing = "\
 JOB_ID     JOB_NAME   MD ST  USER     START_DATE      ELAPSE_LIM NODE_REQUIRE
 4180117    parent.sh  NM RUN alice    10/19 10:00:00  0001:00:00 1
 4180118    parent.sh  NM QUE alice    (10/19 11:00)   0001:00:00 1
 4180119    parent.sh  NM RJT alice    -               0001:00:00 1
";
        let (adapter, runner) = adapter(MockRunner::new().respond_ok(listing));
        let ids: BTreeSet<String> = ["4180117", "4180118", "4180119", "4180120"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let result = adapter.query_statuses(&ids).await.unwrap();
        assert_eq!(result["4180117"].status, JobStatus::Running);
        assert_eq!(result["4180118"].status, JobStatus::Queued);
        assert_eq!(result["4180119"].status, JobStatus::Finished);
        assert_eq!(result["4180120"].raw, "not found in pjstat");
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_status_and_cancel() {
        let (adapter, runner) = adapter(MockRunner::new().respond_ok("summary\n").respond_ok(""));
        assert_eq!(adapter.query_all_status().await.unwrap(), "summary\n");
        adapter.cancel("4180117").await.unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].to_string(), "pjstat --with-summary");
        assert_eq!(calls[1].to_string(), "pjdel 4180117");
    }
}
