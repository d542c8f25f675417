//! Uniform job submission for HPC batch schedulers
//!
//! This crate hides the differences between batch schedulers behind one
//! protocol: validate parameters, render a parent script, submit it, query
//! the status of many jobs at once, and cancel a job.
//!
//! # Overview
//!
//! A submission goes through four steps:
//! 1. **Validation**: merged parameters are checked against the backend's table
//! 2. **Rendering**: a parent script with scheduler directives sources the job file
//! 3. **Submission**: the native submit command is run and the job id extracted
//! 4. **Tracking**: one bulk listing is scraped into `queued`/`running`/`finished`
//!
//! # Supported Schedulers
//!
//! | Backend | Commands | Notes |
//! |---------|----------|-------|
//! | `none` | bash, ps, kill | Background process group on the local host |
//! | `torque` | qsub, qstat, pbsnodes, qdel | `nodes=N:ppn=P` resources |
//! | `slurm` | sbatch, squeue, scancel | |
//! | `pbs_pro` | qsub, qstat, qdel | Account, queue and exclusive placement |
//! | `fugaku` | pjsub, pjstat, pjdel | Resource group derived from nodes and elapse |
//!
//! # Example
//!
//! ```ignore
//! use xsub_sched::{Backend, ParameterSet, SchedulerAdapter, SchedulerConfig, ScriptContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Backend::new(&SchedulerConfig::from_env()?);
//!
//!     let params = ParameterSet::new()
//!         .with("mpi_procs", "8")
//!         .with("ppn", "4")
//!         .with_defaults(backend.parameter_specs());
//!     backend.validate_parameters(&params)?;
//!
//!     let ctx = ScriptContext::new("job.sh", ".", "log", params.clone());
//!     std::fs::write("log/xsub_parent.sh", backend.render_script(&ctx)?)?;
//!
//!     let mut log = std::fs::File::create("log/xsub.log")?;
//!     let handle = backend
//!         .submit("log/xsub_parent.sh".as_ref(), ".".as_ref(), "log".as_ref(), &params, &mut log)
//!         .await?;
//!     println!("Submitted: {}", handle.job_id);
//!
//!     let ids = [handle.job_id].into_iter().collect();
//!     for (id, entry) in backend.query_statuses(&ids).await? {
//!         println!("{id}: {}", entry.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod error;
pub mod fugaku;
pub mod invoker;
pub mod job;
pub mod local;
pub mod params;
pub mod pbs;
pub mod registry;
pub mod slurm;
pub mod status;
pub mod torque;

// Re-exports
pub use adapter::SchedulerAdapter;
pub use error::{SchedError, SchedResult};
pub use fugaku::FugakuAdapter;
pub use invoker::{CommandLine, CommandOutput, CommandRunner, LogSink, MockRunner, SystemRunner};
pub use job::{JobHandle, JobStatus, ScriptContext, StatusEntry};
pub use local::LocalAdapter;
pub use params::{Constraint, ParameterSet, ParameterSpec};
pub use pbs::PbsProAdapter;
pub use registry::{Backend, BackendKind, ENV_VAR, SchedulerConfig};
pub use slurm::SlurmAdapter;
pub use torque::TorqueAdapter;
