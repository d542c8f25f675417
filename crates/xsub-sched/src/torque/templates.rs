//! Torque batch script templates.

use crate::error::SchedResult;
use crate::invoker::shell_quote;
use crate::job::ScriptContext;
use crate::params;

/// Generate the Torque parent script.
pub fn generate_script(ctx: &ScriptContext) -> SchedResult<String> {
    let (nodes, ppn) = params::tiled_nodes(&ctx.parameters)?;
    let walltime = ctx.parameters.require("walltime")?;

    let lines = [
        "#!/bin/bash -x".to_string(),
        format!("#PBS -l nodes={nodes}:ppn={ppn}"),
        format!("#PBS -l walltime={walltime}"),
        format!(". {}", shell_quote(&ctx.job_file.display().to_string())),
    ];
    Ok(lines.join("\n") + "\n")
}
