//! Job Submission Module
//!
//! Turns a list of shell commands into an engine project and runs it.
//!
//! - [`joblist`]: job-list rendering and path rewriting
//! - [`script`]: generated pipeline and engine configuration
//! - [`runner`]: validation and engine invocation

pub mod joblist;
pub mod runner;
pub mod script;

pub use joblist::{absolutize_paths, absolutize_paths_in_line};
pub use runner::{Nextflow, RunStatus};
