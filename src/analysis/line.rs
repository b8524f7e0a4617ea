//! Log Line Classification
//!
//! Every line of `.nextflow.log` is sorted into one of a handful of
//! kinds by looking for literal markers the engine always writes.
//! Anything unrecognised is kept only for its timestamp.

use std::path::PathBuf;

use crate::error::AnalysisError;

use super::record::{Completion, EventKind, TaskEvent};
use super::timestamp::{parse_created_year, LogStamp, CREATED_PREFIX};

/// Marks the line recording the command the engine was launched with.
pub const LAUNCHER_TAG: &str = "DEBUG nextflow.cli.Launcher";

/// Separates the launcher command from the rest of its line.
pub const LAUNCHER_DELIMITER: &str = "$> ";

/// Written once the engine has shut down.
pub const RUN_COMPLETE_TAG: &str = "Execution complete -- Goodbye";

/// Written when a task is handed to the executor.
pub const SUBMISSION_TAG: &str = "Submitted process >";

/// Written instead of [`SUBMISSION_TAG`] when a failed task is retried.
/// The retry runs under a fresh hash.
pub const RESUBMISSION_TAG: &str = "Re-submitted process >";

/// Written by the polling monitor when a task finishes.
pub const TASK_MONITOR_TAG: &str =
    "[Task monitor] DEBUG n.processor.TaskPollingMonitor - Task completed >";

/// Length of a normalized task id.
pub const TASK_ID_LEN: usize = 8;

/// One classified line of the log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogLine {
    /// The `Created:` header with the inferred year.
    Header { year: i32 },
    Launcher { stamp: LogStamp, command: String },
    RunComplete { stamp: LogStamp },
    Task(TaskEvent),
    /// Any other line; only its stamp (if any) matters.
    Other { stamp: Option<LogStamp> },
}

impl LogLine {
    /// Returns the timestamp the line starts with, if any.
    pub fn stamp(&self) -> Option<LogStamp> {
        match self {
            Self::Header { .. } => None,
            Self::Launcher { stamp, .. } | Self::RunComplete { stamp } => Some(*stamp),
            Self::Task(event) => Some(event.stamp),
            Self::Other { stamp } => *stamp,
        }
    }
}

/// Normalizes a raw task hash so submission and monitor lines agree.
///
/// Path separators are dropped and only the first [`TASK_ID_LEN`]
/// characters are kept: `3f/a8c2d1` and `3f/a8c2d1e59b...` both become
/// `3fa8c2d1`.
pub fn normalize_task_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !is_separator(*c))
        .take(TASK_ID_LEN)
        .collect()
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Returns the hash portion of a task work directory: its last two
/// path components (`.../work/3f/a8c2d1e59b...` gives `3f/a8c2d1e59b...`).
fn work_dir_hash(work_dir: &str) -> &str {
    let trimmed = work_dir.trim_end_matches(is_separator);
    let hash_start = trimmed
        .rfind(is_separator)
        .and_then(|last| trimmed[..last].rfind(is_separator));

    match hash_start {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Classifies a single line. `number` is 1-based and used for errors.
pub fn classify(number: usize, line: &str) -> Result<LogLine, AnalysisError> {
    if line.trim_start().starts_with(CREATED_PREFIX) {
        let year = parse_created_year(line)
            .ok_or_else(|| AnalysisError::corrupt(number, line, "header carries no year"))?;
        return Ok(LogLine::Header { year });
    }

    let stamp = LogStamp::from_line(line);

    let Some(tag) = find_tag(line) else {
        // Task output copied into the log may look like a stamp; keep it
        // only when it parses.
        return Ok(LogLine::Other {
            stamp: stamp.and_then(Result::ok),
        });
    };

    let stamp = stamp
        .transpose()
        .map_err(|reason| AnalysisError::corrupt(number, line, reason))?
        .ok_or_else(|| AnalysisError::corrupt(number, line, "tagged line has no timestamp"))?;

    match tag {
        TASK_MONITOR_TAG => parse_monitor(number, line, stamp).map(LogLine::Task),
        SUBMISSION_TAG | RESUBMISSION_TAG => {
            parse_submission(number, line, tag, stamp).map(LogLine::Task)
        }
        LAUNCHER_TAG => {
            let (_, command) = line.split_once(LAUNCHER_DELIMITER).ok_or_else(|| {
                AnalysisError::corrupt(number, line, "launcher line has no command")
            })?;
            Ok(LogLine::Launcher {
                stamp,
                command: command.trim_end().to_string(),
            })
        }
        _ => Ok(LogLine::RunComplete { stamp }),
    }
}

/// Returns the first marker the line carries, if any.
pub fn find_tag(line: &str) -> Option<&'static str> {
    [
        TASK_MONITOR_TAG,
        RESUBMISSION_TAG,
        SUBMISSION_TAG,
        LAUNCHER_TAG,
        RUN_COMPLETE_TAG,
    ]
    .into_iter()
    .find(|tag| line.contains(*tag))
}

/// `... nextflow.Session - [3f/a8c2d1] Submitted process > execute_jobs (1)`
fn parse_submission(
    number: usize,
    line: &str,
    tag: &str,
    stamp: LogStamp,
) -> Result<TaskEvent, AnalysisError> {
    let tag_pos = line.find(tag).unwrap_or(line.len());
    let before = &line[..tag_pos];

    let hash = before
        .rfind('[')
        .and_then(|open| {
            let inner = &before[open + 1..];
            inner.find(']').map(|close| &inner[..close])
        })
        .ok_or_else(|| AnalysisError::corrupt(number, line, "submission has no task hash"))?;

    let task_id = checked_task_id(number, line, hash)?;

    Ok(TaskEvent {
        task_id,
        stamp,
        kind: EventKind::Submitted,
    })
}

/// `... Task completed > TaskHandler[id: 1; name: x; status: COMPLETED; exit: 0; error: -; workDir: /w/3f/a8c2d1...]`
fn parse_monitor(number: usize, line: &str, stamp: LogStamp) -> Result<TaskEvent, AnalysisError> {
    let tag_pos = line.find(TASK_MONITOR_TAG).unwrap_or(0);
    let rest = &line[tag_pos + TASK_MONITOR_TAG.len()..];

    let body = match (rest.find('['), rest.rfind(']')) {
        (Some(open), Some(close)) if open < close => &rest[open + 1..close],
        _ => {
            return Err(AnalysisError::corrupt(
                number,
                line,
                "task record is not bracketed",
            ))
        }
    };

    let mut id = None;
    let mut name = None;
    let mut status = None;
    let mut exit = None;
    let mut work_dir = None;

    for field in body.split(';') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_end_matches(';');
        match key.trim() {
            "id" => id = Some(value),
            "name" => name = Some(value),
            "status" => status = Some(value),
            "exit" => exit = Some(value),
            "workDir" => work_dir = Some(value),
            _ => {}
        }
    }

    required(id, "id", number, line)?;
    let name = required(name, "name", number, line)?;
    let status = required(status, "status", number, line)?;
    let exit = required(exit, "exit", number, line)?;
    let work_dir = required(work_dir, "workDir", number, line)?;

    let exit_code: i32 = exit.parse().map_err(|_| {
        AnalysisError::corrupt(number, line, format!("exit code '{}' is not an integer", exit))
    })?;

    let task_id = checked_task_id(number, line, work_dir_hash(work_dir))?;

    Ok(TaskEvent {
        task_id,
        stamp,
        kind: EventKind::Completed(Completion {
            exit_code,
            name: name.to_string(),
            status: status.to_string(),
            work_dir: PathBuf::from(work_dir),
        }),
    })
}

fn required<'a>(
    value: Option<&'a str>,
    key: &str,
    number: usize,
    line: &str,
) -> Result<&'a str, AnalysisError> {
    value.ok_or_else(|| {
        AnalysisError::corrupt(number, line, format!("task record has no '{}' field", key))
    })
}

fn checked_task_id(number: usize, line: &str, raw: &str) -> Result<String, AnalysisError> {
    let task_id = normalize_task_id(raw);
    if task_id.chars().count() < TASK_ID_LEN {
        return Err(AnalysisError::corrupt(
            number,
            line,
            format!("task id '{}' is shorter than {} characters", raw, TASK_ID_LEN),
        ));
    }
    Ok(task_id)
}
