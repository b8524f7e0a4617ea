//! Run Summary
//!
//! The result of parsing one run's log. Owns every task record and is
//! rebuilt from scratch on each parse.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::record::TaskRecord;

/// Everything the analyzer knows about a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    launcher_command: String,
    run_start: NaiveDateTime,
    run_end: NaiveDateTime,
    year: i32,
    tasks: Vec<TaskRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    excluded_task_ids: Vec<String>,
}

impl RunSummary {
    pub(crate) fn new(
        launcher_command: String,
        run_start: NaiveDateTime,
        run_end: NaiveDateTime,
        year: i32,
        tasks: Vec<TaskRecord>,
        excluded_task_ids: Vec<String>,
    ) -> Self {
        Self {
            launcher_command,
            run_start,
            run_end,
            year,
            tasks,
            excluded_task_ids,
        }
    }

    /// The command line the engine was started with.
    pub fn launcher_command(&self) -> &str {
        &self.launcher_command
    }

    pub fn run_start(&self) -> NaiveDateTime {
        self.run_start
    }

    pub fn run_end(&self) -> NaiveDateTime {
        self.run_end
    }

    /// Year inferred from the log header.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Task records in submission order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Looks up a task by its normalized id.
    pub fn task(&self, task_id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.task_id() == task_id)
    }

    /// Ids left out because only one of their events was found.
    ///
    /// Always empty unless the log was parsed with
    /// [`IncompletePolicy::Ignore`](super::IncompletePolicy::Ignore).
    pub fn excluded_task_ids(&self) -> &[String] {
        &self.excluded_task_ids
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
