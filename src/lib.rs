//! nfbatch - Batch Job Runner and Log Analyzer for Nextflow
//!
//! Runs a list of shell commands as tasks of a generated Nextflow pipeline
//! and reads the engine's log afterwards to recover per-task timings.
//!
//! # Architecture
//!
//! The library is organized into five modules:
//!
//! - [`analysis`]: Run log parsing, task statistics and reports
//! - [`submit`]: Job list, pipeline generation and engine invocation
//! - [`config`]: Typed submitter settings loaded from YAML
//! - [`environment`]: Engine executable and scheduler discovery
//! - [`error`]: Error types for each subsystem
//!
//! The two halves only meet on disk: a run leaves a project directory
//! behind, and the analyzer reads it.
//!
//! # Example
//!
//! ```rust,no_run
//! use nfbatch::analysis::{parse_run_dir, IncompletePolicy, TaskFilter};
//! use nfbatch::config::NextflowConfig;
//! use nfbatch::submit::Nextflow;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let nextflow = Nextflow::new(NextflowConfig::default())?;
//!     nextflow.execute(&["sleep 1", "sleep 2"])?;
//!
//!     let summary = parse_run_dir(nextflow.project_dir(), IncompletePolicy::Strict)?;
//!     let slowest = summary.longest_task(TaskFilter::All)?;
//!     println!("Slowest task: {} ({:?})", slowest.task_id(), slowest.duration());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod environment;
pub mod error;
pub mod submit;

// Re-export commonly used types
pub use analysis::{parse_run_dir, IncompletePolicy, RunSummary, TaskFilter, TaskRecord};
pub use config::{load_config, NextflowConfig};
pub use error::{AnalysisError, StatsError, SubmitError};
pub use submit::{Nextflow, RunStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "nfbatch";
