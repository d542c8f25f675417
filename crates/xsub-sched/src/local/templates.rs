//! Local parent script.

use crate::invoker::shell_quote;
use crate::job::ScriptContext;

/// The local backend needs no directives: the parent script only sources the job file.
pub fn generate_script(ctx: &ScriptContext) -> String {
    format!(". {}\n", shell_quote(&ctx.job_file.display().to_string()))
}
