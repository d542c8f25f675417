//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use xsub_sched::{Backend, ParameterSet, SchedulerConfig};

/// Create the backend named on the command line or in `XSUB_TYPE`.
pub fn create_backend(scheduler: Option<&str>) -> Result<Backend> {
    let config = SchedulerConfig::from_value(scheduler)?;
    tracing::debug!("Using scheduler backend '{}'", config.backend);
    Ok(Backend::new(&config))
}

/// Load submission parameters from a JSON object.
///
/// Numbers and booleans are accepted and converted to their textual form.
pub fn load_params(path: &Path) -> Result<ParameterSet> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
    parse_params(&source).with_context(|| format!("Invalid parameter file: {}", path.display()))
}

fn parse_params(source: &str) -> Result<ParameterSet> {
    let value: Value = serde_json::from_str(source)?;
    let Value::Object(map) = value else {
        anyhow::bail!("expected a JSON object of parameter values");
    };

    map.into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => anyhow::bail!("parameter '{name}' has unsupported value {other}"),
            };
            Ok((name, text))
        })
        .collect()
}
