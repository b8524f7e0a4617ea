//! Environment Discovery Module
//!
//! Finds the engine executable and checks that the selected executor's
//! scheduler is installed.

pub mod nextflow;

pub use nextflow::{
    find_in_path, pick_executor, preflight, resolve_executable, resolve_executor,
    DEFAULT_EXECUTABLE,
};
