//! Log Parser
//!
//! Turns a finished run directory into a [`RunSummary`].
//!
//! The log is read once, front to back. Each line is classified and
//! folded into a builder that is passed along by value; nothing is
//! resolved until the end of the stream because the year needed to
//! complete every timestamp may only show up after the first events.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::error::AnalysisError;

use super::line::{classify, find_tag, LogLine};
use super::record::{Completion, EventKind, TaskRecord};
use super::summary::RunSummary;
use super::timestamp::LogStamp;

/// Primary log written by the engine in its launch directory.
pub const LOG_FILE: &str = ".nextflow.log";

/// Root of the per-task work directories.
pub const WORK_DIR: &str = "work";

/// Engine-internal state (history, cache).
pub const STATE_DIR: &str = ".nextflow";

/// What to do with tasks that have only one of their two events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncompletePolicy {
    /// Fail with [`AnalysisError::IncompleteTaskRecord`].
    #[default]
    Strict,
    /// Leave them out and list them in
    /// [`RunSummary::excluded_task_ids`].
    Ignore,
}

/// The three paths a run directory must contain.
#[derive(Debug, Clone)]
pub struct RunDir {
    pub root: PathBuf,
    pub log_file: PathBuf,
    pub work_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl RunDir {
    /// Checks that `root` looks like a Nextflow launch directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let root = root.as_ref().to_path_buf();
        let run_dir = Self {
            log_file: root.join(LOG_FILE),
            work_dir: root.join(WORK_DIR),
            state_dir: root.join(STATE_DIR),
            root,
        };

        let checks = [
            (&run_dir.log_file, run_dir.log_file.is_file()),
            (&run_dir.work_dir, run_dir.work_dir.is_dir()),
            (&run_dir.state_dir, run_dir.state_dir.is_dir()),
        ];

        if let Some((missing, _)) = checks.iter().find(|(_, ok)| !ok) {
            return Err(AnalysisError::InvalidRunDirectory {
                dir: run_dir.root.clone(),
                missing: (*missing).clone(),
            });
        }

        Ok(run_dir)
    }
}

/// Parses the log of a finished run directory.
///
/// # Example
///
/// ```rust,no_run
/// use nfbatch::analysis::{parse_run_dir, IncompletePolicy, TaskFilter};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let summary = parse_run_dir("nextflow_project_at_1700000000", IncompletePolicy::Strict)?;
///     println!("CPU time: {:?}", summary.total_cpu_time(TaskFilter::All));
///     Ok(())
/// }
/// ```
pub fn parse_run_dir(
    dir: impl AsRef<Path>,
    policy: IncompletePolicy,
) -> Result<RunSummary, AnalysisError> {
    let run_dir = RunDir::open(dir)?;
    info!("Parsing log: {}", run_dir.log_file.display());

    let file = File::open(&run_dir.log_file)?;
    parse_log(BufReader::new(file), policy)
}

/// Parses log text from any buffered reader.
///
/// Lines are split on raw bytes. Task output copied into the log is not
/// always UTF-8, so such lines are decoded lossily; a marker line that
/// does not decode cleanly is [`AnalysisError::CorruptLog`].
pub fn parse_log<R: BufRead>(
    reader: R,
    policy: IncompletePolicy,
) -> Result<RunSummary, AnalysisError> {
    let builder = reader.split(b'\n').enumerate().try_fold(
        RunBuilder::default(),
        |builder, (idx, bytes)| -> Result<RunBuilder, AnalysisError> {
            let number = idx + 1;
            let line = decode_line(number, bytes?)?;
            let parsed = classify(number, &line)?;
            builder.absorb(number, &line, parsed)
        },
    )?;

    builder.finish(policy)
}

fn decode_line(number: usize, mut bytes: Vec<u8>) -> Result<String, AnalysisError> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }

    match String::from_utf8(bytes) {
        Ok(line) => Ok(line),
        Err(e) => {
            let line = String::from_utf8_lossy(e.as_bytes()).into_owned();
            if find_tag(&line).is_some() {
                return Err(AnalysisError::corrupt(number, &line, "line is not valid UTF-8"));
            }
            debug!("Line {} is not valid UTF-8, decoded lossily", number);
            Ok(line)
        }
    }
}

/// A stamp together with the line it came from.
#[derive(Debug, Clone, Copy)]
struct Located {
    line: usize,
    stamp: LogStamp,
}

#[derive(Debug)]
struct PendingCompletion {
    at: Located,
    completion: Completion,
}

/// Accumulated state of a partially read log.
#[derive(Debug, Default)]
struct RunBuilder {
    lines_read: usize,
    year: Option<i32>,
    launcher_command: Option<String>,
    run_start: Option<Located>,
    run_end: Option<Located>,
    /// Submissions in log order
    submitted: Vec<(String, Located)>,
    submitted_ids: HashSet<String>,
    completed: HashMap<String, PendingCompletion>,
    /// Completion ids in log order, for stable error reporting
    completed_order: Vec<String>,
}

impl RunBuilder {
    fn absorb(mut self, number: usize, raw: &str, line: LogLine) -> Result<Self, AnalysisError> {
        self.lines_read = number;

        if self.run_start.is_none() {
            if let Some(stamp) = line.stamp() {
                self.run_start = Some(Located { line: number, stamp });
            }
        }

        match line {
            LogLine::Header { year } => match self.year {
                Some(existing) => {
                    debug!("Ignoring repeated header at line {} (keeping year {})", number, existing)
                }
                None => self.year = Some(year),
            },
            LogLine::Launcher { command, .. } => {
                if let Some(previous) = self.launcher_command.replace(command) {
                    warn!("Launcher line repeated at line {}; replacing '{}'", number, previous);
                }
            }
            LogLine::RunComplete { stamp } => {
                self.run_end = Some(Located { line: number, stamp });
            }
            LogLine::Task(event) => {
                let at = Located {
                    line: number,
                    stamp: event.stamp,
                };
                match event.kind {
                    EventKind::Submitted => {
                        if !self.submitted_ids.insert(event.task_id.clone()) {
                            return Err(AnalysisError::corrupt(
                                number,
                                raw,
                                format!("task {} submitted twice", event.task_id),
                            ));
                        }
                        self.submitted.push((event.task_id, at));
                    }
                    EventKind::Completed(completion) => {
                        if self.completed.contains_key(&event.task_id) {
                            return Err(AnalysisError::corrupt(
                                number,
                                raw,
                                format!("task {} completed twice", event.task_id),
                            ));
                        }
                        self.completed_order.push(event.task_id.clone());
                        self.completed
                            .insert(event.task_id, PendingCompletion { at, completion });
                    }
                }
            }
            LogLine::Other { .. } => {}
        }

        Ok(self)
    }

    fn finish(mut self, policy: IncompletePolicy) -> Result<RunSummary, AnalysisError> {
        let eof = self.lines_read;
        let missing = |what: &str| AnalysisError::corrupt(eof, "<end of file>", format!("no {} found", what));

        let year = self.year.ok_or_else(|| missing("'Created:' header"))?;
        let launcher_command = self.launcher_command.take().ok_or_else(|| missing("launcher line"))?;
        let run_start = self.run_start.ok_or_else(|| missing("timestamped line"))?;
        let run_end = self.run_end.ok_or_else(|| missing("run completion line"))?;

        let run_start = resolve(run_start, year)?;
        let run_end_at = run_end;
        let run_end = resolve(run_end, year)?;
        if run_end < run_start {
            return Err(AnalysisError::corrupt(
                run_end_at.line,
                &run_end_at.stamp.to_string(),
                "run completed before it started",
            ));
        }

        let mut tasks = Vec::with_capacity(self.submitted.len());
        let mut unmatched = Vec::new();

        for (task_id, submitted_at) in self.submitted {
            let Some(pending) = self.completed.remove(&task_id) else {
                unmatched.push(task_id);
                continue;
            };

            let start = resolve(submitted_at, year)?;
            let end = resolve(pending.at, year)?;
            let record = TaskRecord::new(task_id, start, end, pending.completion).map_err(|reason| {
                AnalysisError::corrupt(pending.at.line, &pending.at.stamp.to_string(), reason)
            })?;
            tasks.push(record);
        }

        unmatched.extend(
            self.completed_order
                .into_iter()
                .filter(|id| self.completed.contains_key(id)),
        );

        let excluded_task_ids = match (unmatched.is_empty(), policy) {
            (true, _) => Vec::new(),
            (false, IncompletePolicy::Strict) => {
                return Err(AnalysisError::IncompleteTaskRecord {
                    task_ids: unmatched,
                })
            }
            (false, IncompletePolicy::Ignore) => {
                warn!(
                    "Excluding {} incomplete tasks: {}",
                    unmatched.len(),
                    unmatched.join(", ")
                );
                unmatched
            }
        };

        info!(
            "Parsed {} tasks ({} lines, year {})",
            tasks.len(),
            eof,
            year
        );

        Ok(RunSummary::new(
            launcher_command,
            run_start,
            run_end,
            year,
            tasks,
            excluded_task_ids,
        ))
    }
}

fn resolve(at: Located, year: i32) -> Result<NaiveDateTime, AnalysisError> {
    at.stamp.resolve(year).ok_or_else(|| {
        AnalysisError::corrupt(
            at.line,
            &at.stamp.to_string(),
            format!("date does not exist in {}", year),
        )
    })
}
