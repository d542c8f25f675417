//! PBS Pro batch script templates.

use crate::error::SchedResult;
use crate::invoker::shell_quote;
use crate::job::ScriptContext;
use crate::params;

/// Generate the PBS Pro parent script.
///
/// Account, queue and exclusive placement lines appear only when requested.
pub fn generate_pbs_script(ctx: &ScriptContext) -> SchedResult<String> {
    let params = &ctx.parameters;
    let (nodes, ppn) = params::tiled_nodes(params)?;
    let walltime = params.require("walltime")?;
    let account = params.require("account_name")?;
    let partition = params.require("partition")?;
    let exclusive = params.require_flag("exclusive")?;

    let mut lines = vec!["#!/bin/bash -x".to_string()];
    if !account.is_empty() {
        lines.push(format!("#PBS -A {account}"));
    }
    lines.push(format!("#PBS -l select={nodes}:mpiprocs={ppn}"));
    lines.push(format!("#PBS -l walltime={walltime}"));
    if !partition.is_empty() {
        lines.push(format!("#PBS -q {partition}"));
    }
    if exclusive {
        lines.push("#PBS -l place=excl".to_string());
    }
    lines.push(format!("cd {}", shell_quote(&ctx.work_dir.display().to_string())));
    lines.push(format!(". {}", shell_quote(&ctx.job_file.display().to_string())));

    Ok(lines.join("\n") + "\n")
}
