//! Run Log Analysis
//!
//! Reads what the engine leaves behind after a run and turns it into
//! per-task timings and aggregate statistics.
//!
//! # Components
//!
//! - [`parser`]: run directory checks and the single-pass log parser
//! - [`line`]: classification of individual log lines
//! - [`timestamp`]: year-less log timestamps
//! - [`record`]: task events and merged task records
//! - [`summary`]: the parsed run
//! - [`stats`]: filtered statistics over a run
//! - [`report`]: text, timeline and JSON output

pub mod line;
pub mod parser;
pub mod record;
pub mod report;
pub mod stats;
pub mod summary;
pub mod timestamp;

#[cfg(test)]
pub(crate) mod fixtures;

pub use parser::{parse_log, parse_run_dir, IncompletePolicy, RunDir};
pub use record::{TaskEvent, TaskRecord};
pub use stats::TaskFilter;
pub use summary::RunSummary;
