//! Task Events and Records
//!
//! A [`TaskEvent`] is one state transition read from the log. Once both
//! the submission and the completion of a task have been seen they are
//! merged into a [`TaskRecord`] and the events are dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, info};
use serde::{Serialize, Serializer};

use super::timestamp::LogStamp;

/// Files the engine leaves in every task work directory.
const COMMAND_OUT: &str = ".command.out";
const COMMAND_ERR: &str = ".command.err";
const COMMAND_SCRIPT: &str = ".command.sh";
const COMMAND_RUN: &str = ".command.run";

/// Details only known once a task has finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub exit_code: i32,
    /// Process name as shown by the engine, e.g. `execute_jobs (3)`
    pub name: String,
    /// Engine status, e.g. `COMPLETED`
    pub status: String,
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Submitted,
    Completed(Completion),
}

/// A single task state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEvent {
    /// Normalized hash prefix shared by all events of one task
    pub task_id: String,
    /// Year-less time of the transition
    pub stamp: LogStamp,
    pub kind: EventKind,
}

/// The merged lifecycle of one task.
///
/// Built only from a matching submission/completion pair and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    task_id: String,
    name: String,
    status: String,
    work_dir: PathBuf,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exit_code: i32,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    duration: Duration,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl TaskRecord {
    /// Merges a task's lifecycle. Fails when `end` precedes `start`.
    pub fn new(
        task_id: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        completion: Completion,
    ) -> Result<Self, String> {
        let task_id = task_id.into();
        let duration = (end - start).to_std().map_err(|_| {
            format!(
                "task '{}' completed at {} before it was submitted at {}",
                task_id, end, start
            )
        })?;

        Ok(Self {
            task_id,
            name: completion.name,
            status: completion.status,
            work_dir: completion.work_dir,
            start,
            end,
            exit_code: completion.exit_code,
            duration,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Time between submission and completion.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// True when the task exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Reads the task's captured standard output.
    pub fn stdout(&self) -> io::Result<String> {
        fs::read_to_string(self.work_dir.join(COMMAND_OUT))
    }

    /// Reads the task's captured standard error.
    pub fn stderr(&self) -> io::Result<String> {
        fs::read_to_string(self.work_dir.join(COMMAND_ERR))
    }

    /// Reads the exact command the engine ran for this task.
    pub fn command(&self) -> io::Result<String> {
        fs::read_to_string(self.work_dir.join(COMMAND_SCRIPT))
    }

    /// Runs the task again through the wrapper script the engine left in
    /// its work directory. Blocks until it exits.
    pub fn rerun(&self) -> io::Result<ExitStatus> {
        let wrapper = self.work_dir.join(COMMAND_RUN);
        if !wrapper.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", wrapper.display()),
            ));
        }

        info!("Re-running task {} ({})", self.task_id, self.name);
        let status = Command::new("bash")
            .arg(&wrapper)
            .current_dir(&self.work_dir)
            .status()?;
        debug!("Task {} re-run exited with {:?}", self.task_id, status.code());

        Ok(status)
    }
}
