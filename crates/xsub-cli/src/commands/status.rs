//! Status command implementation.

use std::collections::BTreeSet;

use anyhow::Result;

use xsub_sched::SchedulerAdapter;

use super::common::create_backend;

/// Print statuses of the given jobs as JSON, or the raw listing when none are given.
pub async fn execute(scheduler: Option<&str>, job_ids: &[String]) -> Result<()> {
    let backend = create_backend(scheduler)?;

    if job_ids.is_empty() {
        print!("{}", backend.query_all_status().await?);
        return Ok(());
    }

    let ids: BTreeSet<String> = job_ids.iter().cloned().collect();
    let statuses = backend.query_statuses(&ids).await?;
    println!("{}", serde_json::to_string_pretty(&statuses)?);
    Ok(())
}
