//! Job List
//!
//! The job list is a plain text file with one shell command per line.
//! The generated pipeline reads it and runs every line as a task.

use std::path::Path;

use crate::error::SubmitError;

/// Name of the job list inside the project directory.
pub const JOBLIST_FILE: &str = "joblist.txt";

/// Renders job-list content: each command trimmed and newline-terminated.
pub fn render_joblist<S: AsRef<str>>(jobs: &[S]) -> Result<String, SubmitError> {
    let mut content = String::new();

    for (index, job) in jobs.iter().enumerate() {
        let command = job.as_ref().trim();

        if command.is_empty() {
            return Err(SubmitError::InvalidJob {
                index,
                reason: "empty command".to_string(),
            });
        }
        if command.contains(['\n', '\r']) {
            return Err(SubmitError::InvalidJob {
                index,
                reason: "command spans multiple lines".to_string(),
            });
        }

        content.push_str(command);
        content.push('\n');
    }

    Ok(content)
}

/// Rewrites every whitespace-separated argument that names an existing
/// file or directory (relative to `base`) as an absolute path.
///
/// Arguments are re-joined with single spaces.
pub fn absolutize_paths_in_line(line: &str, base: &Path) -> String {
    line.split_whitespace()
        .map(|arg| {
            let candidate = Path::new(arg);
            if candidate.is_absolute() {
                return arg.to_string();
            }
            let joined = base.join(candidate);
            if joined.exists() {
                joined.display().to_string()
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Applies [`absolutize_paths_in_line`] to every job.
pub fn absolutize_paths<S: AsRef<str>>(jobs: &[S], base: &Path) -> Vec<String> {
    jobs.iter()
        .map(|job| absolutize_paths_in_line(job.as_ref(), base))
        .collect()
}
