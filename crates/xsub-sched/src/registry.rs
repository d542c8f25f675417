//! Backend selection.
//!
//! The backend is chosen once, from an explicit [`SchedulerConfig`], and held
//! as a closed [`Backend`] enum so every dispatch is an exhaustive match.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::SchedulerAdapter;
use crate::error::{SchedError, SchedResult};
use crate::fugaku::FugakuAdapter;
use crate::invoker::{CommandRunner, LogSink, SystemRunner};
use crate::job::{JobHandle, ScriptContext, StatusEntry};
use crate::local::LocalAdapter;
use crate::params::{ParameterSet, ParameterSpec};
use crate::pbs::PbsProAdapter;
use crate::slurm::SlurmAdapter;
use crate::torque::TorqueAdapter;

/// Environment variable naming the backend.
pub const ENV_VAR: &str = "XSUB_TYPE";

/// The supported scheduler backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Plain background processes on the local host (`none`).
    #[serde(rename = "none")]
    Local,
    /// Torque / OpenPBS.
    Torque,
    /// Fujitsu PJM on Fugaku.
    Fugaku,
    /// SLURM.
    Slurm,
    /// Altair PBS Pro.
    PbsPro,
}

impl BackendKind {
    /// Every backend, in registry order.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Local,
        BackendKind::Torque,
        BackendKind::Fugaku,
        BackendKind::Slurm,
        BackendKind::PbsPro,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Local => "none",
            BackendKind::Torque => "torque",
            BackendKind::Fugaku => "fugaku",
            BackendKind::Slurm => "slurm",
            BackendKind::PbsPro => "pbs_pro",
        }
    }

    fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(BackendKind::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                SchedError::Configuration(format!(
                    "invalid scheduler type '{s}'; available values are {}",
                    Self::valid_names()
                ))
            })
    }
}

/// Configuration for backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub backend: BackendKind,
}

impl SchedulerConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self { backend }
    }

    /// Build from an optional backend name; `None` is a configuration error.
    pub fn from_value(value: Option<&str>) -> SchedResult<Self> {
        let Some(name) = value else {
            return Err(SchedError::Configuration(format!(
                "set {ENV_VAR}; available values are {}",
                BackendKind::valid_names()
            )));
        };
        Ok(Self::new(name.parse()?))
    }

    /// Read the backend name from `XSUB_TYPE`.
    pub fn from_env() -> SchedResult<Self> {
        let value = std::env::var(ENV_VAR).ok();
        Self::from_value(value.as_deref())
    }
}

/// The selected scheduler backend.
pub enum Backend {
    Local(LocalAdapter),
    Torque(TorqueAdapter),
    Fugaku(FugakuAdapter),
    Slurm(SlurmAdapter),
    PbsPro(PbsProAdapter),
}

impl Backend {
    /// Create the configured backend, running real subprocesses.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create the configured backend with a custom command runner.
    pub fn with_runner(config: &SchedulerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        match config.backend {
            BackendKind::Local => Backend::Local(LocalAdapter::new(runner)),
            BackendKind::Torque => Backend::Torque(TorqueAdapter::new(runner)),
            BackendKind::Fugaku => Backend::Fugaku(FugakuAdapter::new(runner)),
            BackendKind::Slurm => Backend::Slurm(SlurmAdapter::new(runner)),
            BackendKind::PbsPro => Backend::PbsPro(PbsProAdapter::new(runner)),
        }
    }

    fn adapter(&self) -> &dyn SchedulerAdapter {
        match self {
            Backend::Local(a) => a,
            Backend::Torque(a) => a,
            Backend::Fugaku(a) => a,
            Backend::Slurm(a) => a,
            Backend::PbsPro(a) => a,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backend").field(&self.kind()).finish()
    }
}

#[async_trait]
impl SchedulerAdapter for Backend {
    fn kind(&self) -> BackendKind {
        self.adapter().kind()
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        self.adapter().parameter_specs()
    }

    fn check_semantics(&self, params: &ParameterSet) -> SchedResult<()> {
        self.adapter().check_semantics(params)
    }

    fn render_script(&self, ctx: &ScriptContext) -> SchedResult<String> {
        self.adapter().render_script(ctx)
    }

    async fn submit(
        &self,
        script_path: &Path,
        work_dir: &Path,
        log_dir: &Path,
        params: &ParameterSet,
        log: LogSink<'_>,
    ) -> SchedResult<JobHandle> {
        self.adapter()
            .submit(script_path, work_dir, log_dir, params, log)
            .await
    }

    async fn query_all_status(&self) -> SchedResult<String> {
        self.adapter().query_all_status().await
    }

    async fn query_statuses(
        &self,
        job_ids: &BTreeSet<String>,
    ) -> SchedResult<BTreeMap<String, StatusEntry>> {
        self.adapter().query_statuses(job_ids).await
    }

    async fn cancel(&self, job_id: &str) -> SchedResult<String> {
        self.adapter().cancel(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::MockRunner;

    #[test]
    fn test_backend_kind_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!("SLURM".parse::<BackendKind>().unwrap(), BackendKind::Slurm);
        assert_eq!(" pbs_pro ".parse::<BackendKind>().unwrap(), BackendKind::PbsPro);
    }

    #[test]
    fn test_unknown_backend_lists_valid_names() {
        let err = "lsf".parse::<BackendKind>().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, SchedError::Configuration(_)));
        assert!(msg.contains("none,torque,fugaku,slurm,pbs_pro"));
    }

    #[test]
    fn test_unset_backend() {
        let err = SchedulerConfig::from_value(None).unwrap_err();
        assert!(err.to_string().contains(ENV_VAR));
        assert_eq!(
            SchedulerConfig::from_value(Some("fugaku")).unwrap().backend,
            BackendKind::Fugaku
        );
    }

    #[test]
    fn test_registry_dispatch() {
        for kind in BackendKind::ALL {
            let backend =
                Backend::with_runner(&SchedulerConfig::new(kind), Arc::new(MockRunner::new()));
            assert_eq!(backend.kind(), kind);
            assert!(!backend.parameter_specs().is_empty());
        }
    }

    #[test]
    fn test_backend_debug_names_kind() {
        let backend = Backend::with_runner(
            &SchedulerConfig::new(BackendKind::PbsPro),
            Arc::new(MockRunner::new()),
        );
        assert_eq!(format!("{backend:?}"), "Backend(PbsPro)");
    }

    #[test]
    fn test_backend_kind_serde_names() {
        assert_eq!(serde_json::to_string(&BackendKind::Local).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&BackendKind::PbsPro).unwrap(), "\"pbs_pro\"");
    }
}
