//! SLURM batch script templates.

use crate::error::SchedResult;
use crate::invoker::shell_quote;
use crate::job::ScriptContext;
use crate::params;

/// Generate the SLURM parent script.
pub fn generate_batch_script(ctx: &ScriptContext) -> SchedResult<String> {
    let (nodes, ppn) = params::tiled_nodes(&ctx.parameters)?;
    let walltime = ctx.parameters.require("walltime")?;

    let lines = [
        "#!/bin/bash -x".to_string(),
        format!("#SBATCH --nodes={nodes}"),
        format!("#SBATCH --ntasks-per-node={ppn}"),
        format!("#SBATCH --time={walltime}"),
        format!(". {}", shell_quote(&ctx.job_file.display().to_string())),
    ];
    Ok(lines.join("\n") + "\n")
}
