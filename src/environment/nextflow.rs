//! Engine and Scheduler Discovery
//!
//! Locates the Nextflow executable and the scheduler binaries that
//! cluster executors depend on.
//!
//! # Executable Resolution Priority
//!
//! 1. Explicit path from the configuration (must exist)
//! 2. `nextflow` on the system PATH
//!
//! With the preflight check disabled, a missing PATH entry is not an
//! error and the bare name is handed to the process spawner.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};

use crate::config::Executor;
use crate::error::SubmitError;

/// Engine binary looked up on PATH.
pub const DEFAULT_EXECUTABLE: &str = "nextflow";

/// Looks a binary up on PATH.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path_str.is_empty() {
        None
    } else {
        Some(PathBuf::from(path_str))
    }
}

/// Resolves the engine executable.
pub fn resolve_executable(
    explicit: Option<&Path>,
    require_on_path: bool,
) -> Result<PathBuf, SubmitError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(SubmitError::ExecutableNotFound(path.to_path_buf()));
        }
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };
        info!("Using Nextflow executable: {}", absolute.display());
        return Ok(absolute);
    }

    match find_in_path(DEFAULT_EXECUTABLE) {
        Some(path) => {
            info!("Using system Nextflow: {}", path.display());
            Ok(path)
        }
        None if require_on_path => {
            warn!("Nextflow binary not found");
            warn!("  Searched: system PATH");
            warn!("  Download from: https://www.nextflow.io/");
            Err(SubmitError::ExecutableNotFound(PathBuf::from(DEFAULT_EXECUTABLE)))
        }
        None => {
            debug!("'{}' not on PATH, leaving it to the spawner", DEFAULT_EXECUTABLE);
            Ok(PathBuf::from(DEFAULT_EXECUTABLE))
        }
    }
}

/// Runs `<executable> -v` and returns the reported version line.
pub fn preflight(
    executable: &Path,
    engine_env: &BTreeMap<String, String>,
) -> Result<String, SubmitError> {
    let command = format!("{} -v", executable.display());
    debug!("Preflight: {}", command);

    let output = Command::new(executable)
        .arg("-v")
        .envs(engine_env)
        .output()
        .map_err(|e| {
            debug!("Preflight spawn failed: {}", e);
            SubmitError::PreflightFailed {
                command: command.clone(),
                code: None,
            }
        })?;

    if !output.status.success() {
        return Err(SubmitError::PreflightFailed {
            command,
            code: output.status.code(),
        });
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    info!("Nextflow available: {}", version);
    Ok(version)
}

/// Checks that `executor` can run here.
///
/// `is_available` answers whether a scheduler binary exists. When it does
/// not, the result is the local executor if `switch_to_local` is set and
/// [`SubmitError::MissingExecutorDependency`] otherwise.
pub fn resolve_executor<F>(
    executor: Executor,
    switch_to_local: bool,
    is_available: F,
) -> Result<Executor, SubmitError>
where
    F: Fn(&str) -> bool,
{
    let Some(binary) = executor.dependency() else {
        return Ok(executor);
    };

    if is_available(binary) {
        debug!("Executor '{}' dependency '{}' found", executor, binary);
        return Ok(executor);
    }

    if switch_to_local {
        warn!(
            "'{}' not found, switching executor from '{}' to 'local'",
            binary, executor
        );
        return Ok(Executor::Local);
    }

    Err(SubmitError::MissingExecutorDependency {
        executor: executor.to_string(),
        binary: binary.to_string(),
    })
}

/// First cluster executor whose scheduler is installed, else local.
pub fn pick_executor() -> Executor {
    pick_executor_with(|binary| find_in_path(binary).is_some())
}

fn pick_executor_with<F>(is_available: F) -> Executor
where
    F: Fn(&str) -> bool,
{
    Executor::CLUSTER
        .into_iter()
        .find(|executor| executor.dependency().is_some_and(&is_available))
        .unwrap_or(Executor::Local)
}
