//! xsub Command-Line Interface
//!
//! Submits, tracks and cancels batch jobs on whichever scheduler `XSUB_TYPE`
//! (or `--scheduler`) names.
//!
//! ```text
//! $ export XSUB_TYPE=slurm
//! $ xsub submit job.sh -p params.json -d run -l run/log
//! $ xsub status 4711 4712
//! $ xsub cancel 4711
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{cancel, params, status, submit};

/// xsub - one submission interface for HPC batch schedulers
#[derive(Parser)]
#[command(name = "xsub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Scheduler backend (none, torque, fugaku, slurm, pbs_pro)
    #[arg(short, long, env = "XSUB_TYPE", global = true)]
    scheduler: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the backend's parameters with their defaults
    Params,

    /// Render a parent script for a job file and submit it
    Submit {
        /// Job script to run
        job_file: PathBuf,

        /// JSON object of submission parameters
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Working directory of the job
        #[arg(short = 'd', long, default_value = ".")]
        work_dir: PathBuf,

        /// Directory for the parent script and logs
        #[arg(short = 'l', long, default_value = ".")]
        log_dir: PathBuf,
    },

    /// Query job status (all jobs when no id is given)
    Status {
        /// Job ids
        job_ids: Vec<String>,
    },

    /// Cancel a job
    Cancel {
        /// Job id
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let scheduler = cli.scheduler.as_deref();
    let result = match cli.command {
        Commands::Params => params::execute(scheduler),

        Commands::Submit {
            job_file,
            params,
            work_dir,
            log_dir,
        } => submit::execute(scheduler, &job_file, params.as_deref(), &work_dir, &log_dir).await,

        Commands::Status { job_ids } => status::execute(scheduler, &job_ids).await,

        Commands::Cancel { job_id } => cancel::execute(scheduler, &job_id).await,
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
