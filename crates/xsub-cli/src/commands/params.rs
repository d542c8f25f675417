//! Params command implementation.

use anyhow::Result;
use serde_json::json;

use xsub_sched::SchedulerAdapter;

use super::common::create_backend;

/// Print the backend's parameter table as JSON.
pub fn execute(scheduler: Option<&str>) -> Result<()> {
    let backend = create_backend(scheduler)?;
    let table = json!({
        "scheduler": backend.kind(),
        "parameters": backend.parameter_specs(),
    });
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
