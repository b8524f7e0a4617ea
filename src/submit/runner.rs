//! Engine Runner
//!
//! Validates a configuration, lays out a project directory and runs the
//! engine against a job list.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, info, warn};

use crate::analysis::parser::LOG_FILE;
use crate::config::{Executor, NextflowConfig};
use crate::environment::{find_in_path, preflight, resolve_executable, resolve_executor};
use crate::error::SubmitError;

use super::joblist::{render_joblist, JOBLIST_FILE};
use super::script::{render_config, render_script, CONFIG_FILE, SCRIPT_FILE};

/// Outcome of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// The engine exited non-zero or was killed by a signal.
    EngineFailed { code: Option<i32> },
}

impl RunStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::EngineFailed { .. } => 1,
        }
    }
}

/// A validated engine setup bound to one project directory.
///
/// # Example
///
/// ```rust,no_run
/// use nfbatch::config::NextflowConfig;
/// use nfbatch::submit::Nextflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let nextflow = Nextflow::new(NextflowConfig::default())?;
///     let status = nextflow.execute(&["echo a", "echo b"])?;
///     println!("exit code {}", status.exit_code());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Nextflow {
    config: NextflowConfig,
    executable: PathBuf,
    executor: Executor,
    project_name: String,
    project_dir: PathBuf,
}

impl Nextflow {
    /// Checks everything that can be checked before a process is spawned.
    pub fn new(config: NextflowConfig) -> Result<Self, SubmitError> {
        Self::with_lookup(config, |binary| find_in_path(binary).is_some())
    }

    fn with_lookup<F>(config: NextflowConfig, is_available: F) -> Result<Self, SubmitError>
    where
        F: Fn(&str) -> bool,
    {
        config.validate()?;
        let working_dir = config.resolved_working_dir()?;

        let check = !config.skip_executable_check;
        let executable = resolve_executable(config.executable.as_deref(), check)?;
        if check {
            preflight(&executable, &config.engine_env)?;
        } else {
            debug!("Skipping Nextflow preflight check");
        }

        let executor = resolve_executor(config.executor, config.switch_to_local, is_available)?;

        let project_name = config.resolved_project_name();
        let project_dir = working_dir.join(&project_name);

        Ok(Self {
            config,
            executable,
            executor,
            project_name,
            project_dir,
        })
    }

    pub fn config(&self) -> &NextflowConfig {
        &self.config
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Executor actually used, after any fallback to local.
    pub fn executor(&self) -> Executor {
        self.executor
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Where the job list, generated files and engine logs end up.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Runs every job as one engine task and waits for the engine.
    ///
    /// Invalid jobs are rejected before anything is written.
    pub fn execute<S: AsRef<str>>(&self, jobs: &[S]) -> Result<RunStatus, SubmitError> {
        let joblist = render_joblist(jobs)?;

        if self.project_dir.join(LOG_FILE).exists() {
            warn!(
                "Project directory {} already holds a run log; the engine will rotate it",
                self.project_dir.display()
            );
        }
        fs::create_dir_all(&self.project_dir)?;

        let joblist_path = self.project_dir.join(JOBLIST_FILE);
        let script_path = self.project_dir.join(SCRIPT_FILE);
        let config_path = self.project_dir.join(CONFIG_FILE);

        fs::write(&joblist_path, joblist)?;
        fs::write(
            &script_path,
            render_script(&self.project_name, &joblist_path, &self.config),
        )?;
        fs::write(
            &config_path,
            render_config(&self.project_name, self.executor, &self.config),
        )?;

        info!(
            "Running {} jobs with executor '{}' in {}",
            jobs.len(),
            self.executor,
            self.project_dir.display()
        );

        let status = Command::new(&self.executable)
            .arg(&script_path)
            .arg("-c")
            .arg(&config_path)
            .current_dir(&self.project_dir)
            .envs(&self.config.engine_env)
            .status()?;

        let run_status = if status.success() {
            info!("Nextflow pipeline finished");
            RunStatus::Success
        } else {
            error!("Nextflow pipeline failed with exit code: {:?}", status.code());
            RunStatus::EngineFailed {
                code: status.code(),
            }
        };

        if self.config.remove_logs.should_remove(run_status.succeeded()) {
            self.remove_project_dir();
        }

        Ok(run_status)
    }

    fn remove_project_dir(&self) {
        match fs::remove_dir_all(&self.project_dir) {
            Ok(()) => debug!("Removed project directory {}", self.project_dir.display()),
            Err(e) => warn!(
                "Failed to remove project directory {}: {}",
                self.project_dir.display(),
                e
            ),
        }
    }
}

impl fmt::Display for Nextflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nextflow wrapper:")?;
        writeln!(f, "  executable: {}", self.executable.display())?;
        writeln!(f, "  executor: {}", self.executor)?;
        writeln!(f, "  queue: {}", self.config.queue)?;
        writeln!(f, "  memory: {}", self.config.memory)?;
        writeln!(f, "  time: {}", self.config.time)?;
        writeln!(f, "  cpus: {}", self.config.cpus)?;
        write!(f, "  project: {}", self.project_dir.display())
    }
}
