//! Submitter Configuration
//!
//! Typed settings for one engine run, with documented defaults.
//!
//! # Example YAML Format
//!
//! ```yaml
//! executor: slurm
//! queue: long
//! memory: 16G
//! time: 4h
//! cpus: 2
//! queue_size: 200
//! error_strategy: retry
//! max_retries: 2
//! retry_increase_memory: true
//! cluster_options: "--account=lab"
//! remove_logs: on_success
//! switch_to_local: true
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

pub mod resources;

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

pub use resources::{MemorySize, MemoryUnit, TimeLimit, TimeUnit};

/// Prefix of generated project directory names.
pub const PROJECT_PREFIX: &str = "nextflow_project_at_";

/// Engine backend that places the tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    #[default]
    Local,
    Slurm,
    Lsf,
    Sge,
    Pbs,
    PbsPro,
}

impl Executor {
    /// Cluster executors in the order [`pick_executor`] tries them.
    ///
    /// [`pick_executor`]: crate::environment::pick_executor
    pub const CLUSTER: [Executor; 5] = [
        Executor::Slurm,
        Executor::Lsf,
        Executor::Sge,
        Executor::Pbs,
        Executor::PbsPro,
    ];

    /// Scheduler binary the engine shells out to for this executor.
    pub fn dependency(&self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::Slurm => Some("sbatch"),
            Self::Lsf => Some("bsub"),
            Self::Sge | Self::Pbs | Self::PbsPro => Some("qsub"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Slurm => "slurm",
            Self::Lsf => "lsf",
            Self::Sge => "sge",
            Self::Pbs => "pbs",
            Self::PbsPro => "pbspro",
        }
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Executor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "slurm" => Ok(Self::Slurm),
            "lsf" => Ok(Self::Lsf),
            "sge" => Ok(Self::Sge),
            "pbs" => Ok(Self::Pbs),
            "pbspro" => Ok(Self::PbsPro),
            other => Err(format!(
                "unknown executor '{}' (expected local, slurm, lsf, sge, pbs, pbspro)",
                other
            )),
        }
    }
}

/// What the engine does when a task fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    #[default]
    Retry,
    Ignore,
    Terminate,
    Finish,
}

impl fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retry => "retry",
            Self::Ignore => "ignore",
            Self::Terminate => "terminate",
            Self::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// When the project directory is deleted after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRemoval {
    #[default]
    Never,
    OnSuccess,
    Always,
}

impl LogRemoval {
    pub fn should_remove(&self, succeeded: bool) -> bool {
        match self {
            Self::Never => false,
            Self::OnSuccess => succeeded,
            Self::Always => true,
        }
    }
}

impl FromStr for LogRemoval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(Self::Never),
            "on_success" | "on-success" => Ok(Self::OnSuccess),
            "always" => Ok(Self::Always),
            other => Err(format!(
                "unknown removal policy '{}' (expected never, on_success, always)",
                other
            )),
        }
    }
}

/// Settings for one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NextflowConfig {
    pub executor: Executor,
    pub queue: String,
    pub memory: MemorySize,
    pub time: TimeLimit,
    pub cpus: u32,
    /// Maximum number of tasks queued at once.
    pub queue_size: u32,
    pub error_strategy: ErrorStrategy,
    pub max_retries: u32,
    /// Multiply memory by the attempt number on retry.
    pub retry_increase_memory: bool,
    /// Multiply time by the attempt number on retry.
    pub retry_increase_time: bool,
    /// Passed verbatim to the cluster scheduler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_options: Option<String>,
    pub remove_logs: LogRemoval,
    /// Explicit engine executable. `nextflow` on `PATH` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    pub skip_executable_check: bool,
    /// Fall back to the local executor when the scheduler binary is missing.
    pub switch_to_local: bool,
    /// Parent of the project directory. Current directory otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Project directory name. Timestamp-derived otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Environment handed to the engine process.
    pub engine_env: BTreeMap<String, String>,
}

impl Default for NextflowConfig {
    fn default() -> Self {
        let mut engine_env = BTreeMap::new();
        engine_env.insert("NXF_DEFAULT_DSL".to_string(), "1".to_string());

        Self {
            executor: Executor::Local,
            queue: "batch".to_string(),
            memory: MemorySize::default(),
            time: TimeLimit::default(),
            cpus: 1,
            queue_size: 100,
            error_strategy: ErrorStrategy::Retry,
            max_retries: 3,
            retry_increase_memory: false,
            retry_increase_time: false,
            cluster_options: None,
            remove_logs: LogRemoval::Never,
            executable: None,
            skip_executable_check: false,
            switch_to_local: false,
            working_dir: None,
            project_name: None,
            engine_env,
        }
    }
}

impl NextflowConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SubmitError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that serde cannot express.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.queue.trim().is_empty() {
            return Err(SubmitError::InvalidConfig("queue must not be empty".to_string()));
        }
        if self.cpus == 0 {
            return Err(SubmitError::InvalidConfig("cpus must be at least 1".to_string()));
        }
        if self.queue_size == 0 {
            return Err(SubmitError::InvalidConfig(
                "queue_size must be at least 1".to_string(),
            ));
        }
        if let Some(name) = &self.project_name {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(SubmitError::InvalidConfig(format!(
                    "project_name '{}' must be a plain directory name",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Directory the project directory is created in.
    pub fn resolved_working_dir(&self) -> Result<PathBuf, SubmitError> {
        let dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        if !dir.is_dir() {
            return Err(SubmitError::WorkingDirMissing(dir));
        }
        Ok(dir)
    }

    /// Configured project name, or a fresh timestamp-derived one.
    pub fn resolved_project_name(&self) -> String {
        self.project_name
            .clone()
            .unwrap_or_else(default_project_name)
    }
}

/// `nextflow_project_at_<unix seconds>`.
pub fn default_project_name() -> String {
    format!("{}{}", PROJECT_PREFIX, Utc::now().timestamp())
}

/// Loads a configuration file.
///
/// # Example
///
/// ```rust,no_run
/// use nfbatch::config::load_config;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("nfbatch.yaml")?;
///     println!("Executor: {}", config.executor);
///     Ok(())
/// }
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<NextflowConfig, SubmitError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let yaml = fs::read_to_string(path)?;
    debug!("Configuration loaded ({} bytes)", yaml.len());

    NextflowConfig::from_yaml_str(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = NextflowConfig::default();
        assert_eq!(config.executor, Executor::Local);
        assert_eq!(config.queue, "batch");
        assert_eq!(config.memory.to_string(), "10 GB");
        assert_eq!(config.time.to_string(), "1h");
        assert_eq!(config.cpus, 1);
        assert_eq!(config.queue_size, 100);
        assert_eq!(config.error_strategy, ErrorStrategy::Retry);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.remove_logs, LogRemoval::Never);
        assert_eq!(config.engine_env.get("NXF_DEFAULT_DSL").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = NextflowConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, NextflowConfig::default());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
executor: slurm
queue: long
memory: 16G
time: 4h
cpus: 2
error_strategy: ignore
retry_increase_memory: true
cluster_options: "--account=lab"
remove_logs: on_success
switch_to_local: true
"#;
        let config = NextflowConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.executor, Executor::Slurm);
        assert_eq!(config.queue, "long");
        assert_eq!(config.memory, MemorySize::new(16, MemoryUnit::GB));
        assert_eq!(config.time, TimeLimit::new(4, TimeUnit::Hours));
        assert_eq!(config.cpus, 2);
        assert_eq!(config.error_strategy, ErrorStrategy::Ignore);
        assert!(config.retry_increase_memory);
        assert!(!config.retry_increase_time);
        assert_eq!(config.cluster_options.as_deref(), Some("--account=lab"));
        assert_eq!(config.remove_logs, LogRemoval::OnSuccess);
        assert!(config.switch_to_local);
        // untouched keys keep their defaults
        assert_eq!(config.queue_size, 100);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = NextflowConfig::from_yaml_str("executor: local\nthreads: 4\n");
        assert!(matches!(result, Err(SubmitError::Config(_))));
    }

    #[test]
    fn test_bad_unit_rejected() {
        let result = NextflowConfig::from_yaml_str("memory: 10X\n");
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("unknown memory unit"));
    }

    #[test]
    fn test_validate_rejects_zero_cpus() {
        let config = NextflowConfig {
            cpus: 0,
            ..NextflowConfig::default()
        };
        assert!(matches!(config.validate(), Err(SubmitError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_nested_project_name() {
        let config = NextflowConfig {
            project_name: Some("a/b".to_string()),
            ..NextflowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_executor_dependencies() {
        assert_eq!(Executor::Local.dependency(), None);
        assert_eq!(Executor::Slurm.dependency(), Some("sbatch"));
        assert_eq!(Executor::Lsf.dependency(), Some("bsub"));
        assert_eq!(Executor::PbsPro.dependency(), Some("qsub"));
        assert_eq!("PBSPro".parse::<Executor>(), Ok(Executor::PbsPro));
        assert!("condor".parse::<Executor>().is_err());
    }

    #[test]
    fn test_log_removal_policy() {
        assert!(!LogRemoval::Never.should_remove(true));
        assert!(LogRemoval::OnSuccess.should_remove(true));
        assert!(!LogRemoval::OnSuccess.should_remove(false));
        assert!(LogRemoval::Always.should_remove(false));
        assert_eq!("on-success".parse::<LogRemoval>(), Ok(LogRemoval::OnSuccess));
    }

    #[test]
    fn test_working_dir_missing() {
        let config = NextflowConfig {
            working_dir: Some(PathBuf::from("/definitely/not/here")),
            ..NextflowConfig::default()
        };
        assert!(matches!(
            config.resolved_working_dir(),
            Err(SubmitError::WorkingDirMissing(_))
        ));
    }

    #[test]
    fn test_default_project_name() {
        let name = NextflowConfig::default().resolved_project_name();
        assert!(name.starts_with(PROJECT_PREFIX));
        assert!(name[PROJECT_PREFIX.len()..].parse::<i64>().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nfbatch.yaml");
        fs::write(&path, "queue: short\nmax_retries: 0\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.queue, "short");
        assert_eq!(config.max_retries, 0);
    }
}
