//! Error Types
//!
//! One error enum per subsystem:
//!
//! - [`AnalysisError`]: reading and parsing a finished run's log
//! - [`StatsError`]: statistics queries over a parsed run
//! - [`SubmitError`]: configuring and launching the engine

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::stats::TaskFilter;

/// Errors raised while turning a run directory into a [`RunSummary`].
///
/// [`RunSummary`]: crate::analysis::RunSummary
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A required log file or directory is missing.
    #[error("'{dir}' is not a Nextflow run directory: {missing} not found")]
    InvalidRunDirectory { dir: PathBuf, missing: PathBuf },

    /// The log is missing a required line or contains a malformed one.
    #[error("corrupt log at line {line}: {reason} (line: {content:?})")]
    CorruptLog {
        line: usize,
        content: String,
        reason: String,
    },

    /// Some tasks were submitted but never completed, or the other way round.
    #[error("incomplete task records for ids: {}", task_ids.join(", "))]
    IncompleteTaskRecord { task_ids: Vec<String> },

    #[error("failed to read log: {0}")]
    Io(#[from] io::Error),
}

impl AnalysisError {
    /// Builds a [`AnalysisError::CorruptLog`] for a 1-based line number.
    pub fn corrupt(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::CorruptLog {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by statistics queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The requested filter flags can never match anything.
    #[error("only-failed and only-succeeded cannot be requested together")]
    InvalidFilterCombination,

    /// The filtered task set is empty.
    #[error("no tasks match filter '{0}'")]
    NoMatchingTasks(TaskFilter),
}

/// Errors raised before or while launching the engine.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The chosen executor needs a scheduler binary that is not installed.
    #[error("executor '{executor}' requires '{binary}' which was not found in PATH")]
    MissingExecutorDependency { executor: String, binary: String },

    #[error("Nextflow executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    /// `nextflow -v` did not exit cleanly.
    #[error("Nextflow preflight check failed: '{command}' exited with {code:?}. See https://www.nextflow.io/ for installation")]
    PreflightFailed { command: String, code: Option<i32> },

    #[error("invalid resource value '{value}': {reason}")]
    InvalidResourceUnit { value: String, reason: String },

    #[error("working directory does not exist: {0}")]
    WorkingDirMissing(PathBuf),

    #[error("job #{index} is invalid: {reason}")]
    InvalidJob { index: usize, reason: String },

    /// A setting is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SubmitError {
    pub(crate) fn invalid_unit(value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResourceUnit {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
