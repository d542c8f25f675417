//! Cancel command implementation.

use anyhow::Result;

use xsub_sched::SchedulerAdapter;

use super::common::create_backend;

/// Cancel one job and print the scheduler's response.
pub async fn execute(scheduler: Option<&str>, job_id: &str) -> Result<()> {
    let backend = create_backend(scheduler)?;
    let output = backend.cancel(job_id).await?;
    print!("{output}");
    Ok(())
}
