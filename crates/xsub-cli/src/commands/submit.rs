//! Submit command implementation.
//!
//! Renders the parent script into the log directory and hands it to the
//! backend's submit command.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};

use xsub_sched::{ParameterSet, SchedulerAdapter, ScriptContext};

use super::common::{create_backend, load_params};

/// File name of the rendered parent script inside the log directory.
pub const PARENT_SCRIPT: &str = "xsub_parent.sh";

/// File name of the submission log inside the log directory.
pub const SUBMIT_LOG: &str = "xsub.log";

/// Execute the submit command.
pub async fn execute(
    scheduler: Option<&str>,
    job_file: &Path,
    params_file: Option<&Path>,
    work_dir: &Path,
    log_dir: &Path,
) -> Result<()> {
    let backend = create_backend(scheduler)?;

    if !job_file.is_file() {
        anyhow::bail!("File not found: {}", job_file.display());
    }
    let job_file = std::path::absolute(job_file)
        .with_context(|| format!("Failed to resolve {}", job_file.display()))?;

    let params = match params_file {
        Some(path) => load_params(path)?,
        None => ParameterSet::new(),
    }
    .with_defaults(backend.parameter_specs());
    backend.validate_parameters(&params)?;

    fs::create_dir_all(work_dir)
        .with_context(|| format!("Failed to create {}", work_dir.display()))?;
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;
    let work_dir = std::path::absolute(work_dir)?;
    let log_dir = std::path::absolute(log_dir)?;

    let ctx = ScriptContext::new(&job_file, &work_dir, &log_dir, params.clone());
    let script = backend.render_script(&ctx)?;
    let script_path = log_dir.join(PARENT_SCRIPT);
    fs::write(&script_path, script)
        .with_context(|| format!("Failed to write {}", script_path.display()))?;
    make_executable(&script_path)?;

    let log_path = log_dir.join(SUBMIT_LOG);
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    let handle = backend
        .submit(&script_path, &work_dir, &log_dir, &params, &mut log)
        .await?;

    println!("{}", serde_json::to_string_pretty(&handle)?);
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
