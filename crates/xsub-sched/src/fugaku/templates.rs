//! PJM batch script templates.

use crate::error::SchedResult;
use crate::invoker::shell_quote;
use crate::job::ScriptContext;

/// Generate the PJM parent script. `rscgrp` must already be resolved.
pub fn generate_pjm_script(ctx: &ScriptContext, rscgrp: &str) -> SchedResult<String> {
    let params = &ctx.parameters;
    let node = params.require("node")?;
    let elapse = params.require("elapse")?;
    let shape = params.require("shape")?;
    let mpi_procs = params.require("mpi_procs")?;
    let max_per_node = params.require("max_mpi_procs_per_node")?;

    let lines = [
        "#!/bin/bash -x".to_string(),
        "#".to_string(),
        format!("#PJM --rsc-list \"node={node}\""),
        format!("#PJM --rsc-list \"rscgrp={rscgrp}\""),
        format!("#PJM --rsc-list \"elapse={elapse}\""),
        format!("#PJM --mpi \"shape={shape}\""),
        format!("#PJM --mpi \"proc={mpi_procs}\""),
        format!("#PJM --mpi \"max-proc-per-node={max_per_node}\""),
        "#PJM -s".to_string(),
        format!(". {}", shell_quote(&ctx.job_file.display().to_string())),
    ];
    Ok(lines.join("\n") + "\n")
}
