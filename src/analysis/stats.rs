//! Run Statistics
//!
//! Pure queries over a [`RunSummary`]. None of them mutate the summary
//! and all of them can be repeated with different filters.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::StatsError;

use super::record::TaskRecord;
use super::summary::RunSummary;

/// Which tasks a statistic should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskFilter {
    #[default]
    All,
    /// Non-zero exit code
    OnlyFailed,
    /// Exit code 0
    OnlySucceeded,
}

impl TaskFilter {
    /// Builds a filter from independent "only failed" / "only succeeded"
    /// switches, as exposed on the command line.
    pub fn from_flags(only_failed: bool, only_succeeded: bool) -> Result<Self, StatsError> {
        match (only_failed, only_succeeded) {
            (true, true) => Err(StatsError::InvalidFilterCombination),
            (true, false) => Ok(Self::OnlyFailed),
            (false, true) => Ok(Self::OnlySucceeded),
            (false, false) => Ok(Self::All),
        }
    }

    pub fn matches(&self, task: &TaskRecord) -> bool {
        match self {
            Self::All => true,
            Self::OnlyFailed => !task.succeeded(),
            Self::OnlySucceeded => task.succeeded(),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::OnlyFailed => write!(f, "only-failed"),
            Self::OnlySucceeded => write!(f, "only-succeeded"),
        }
    }
}

impl RunSummary {
    /// Tasks matching `filter`, in log order.
    pub fn filtered(&self, filter: TaskFilter) -> impl Iterator<Item = &TaskRecord> + '_ {
        self.tasks().iter().filter(move |task| filter.matches(task))
    }

    pub fn task_count(&self, filter: TaskFilter) -> usize {
        self.filtered(filter).count()
    }

    /// Wall-clock span of the whole run, from the first log line to the
    /// completion line. Not the sum of task durations.
    pub fn total_wall_time(&self) -> Duration {
        (self.run_end() - self.run_start())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Sum of the durations of all matching tasks.
    pub fn total_cpu_time(&self, filter: TaskFilter) -> Duration {
        self.filtered(filter).map(TaskRecord::duration).sum()
    }

    /// Mean duration of the matching tasks.
    pub fn average_task_duration(&self, filter: TaskFilter) -> Result<Duration, StatsError> {
        let (count, total) = self
            .filtered(filter)
            .fold((0u128, 0u128), |(count, total), task| {
                (count + 1, total + task.duration().as_nanos())
            });

        if count == 0 {
            return Err(StatsError::NoMatchingTasks(filter));
        }

        let mean = total / count;
        Ok(Duration::new(
            (mean / 1_000_000_000) as u64,
            (mean % 1_000_000_000) as u32,
        ))
    }

    /// The matching task that took the longest. Ties go to the task seen
    /// first in the log.
    pub fn longest_task(&self, filter: TaskFilter) -> Result<&TaskRecord, StatsError> {
        self.filtered(filter)
            .fold(None::<&TaskRecord>, |best, task| match best {
                Some(current) if current.duration() >= task.duration() => Some(current),
                _ => Some(task),
            })
            .ok_or(StatsError::NoMatchingTasks(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{standard_log, TaskSpec};
    use crate::analysis::{parse_log, IncompletePolicy};

    fn summary(tasks: &[TaskSpec<'_>]) -> RunSummary {
        parse_log(standard_log(2021, tasks).as_bytes(), IncompletePolicy::Strict).unwrap()
    }

    #[test]
    fn test_filter_from_flags() {
        assert_eq!(TaskFilter::from_flags(false, false), Ok(TaskFilter::All));
        assert_eq!(TaskFilter::from_flags(true, false), Ok(TaskFilter::OnlyFailed));
        assert_eq!(TaskFilter::from_flags(false, true), Ok(TaskFilter::OnlySucceeded));
        assert_eq!(
            TaskFilter::from_flags(true, true),
            Err(StatsError::InvalidFilterCombination)
        );
    }

    #[test]
    fn test_single_task_statistics() {
        let summary = summary(&[("3f/a8c2d1", "Jan-05 10:00:00.000", "Jan-05 10:00:05.250", 0)]);
        let expected = Duration::from_millis(5250);

        assert_eq!(summary.total_cpu_time(TaskFilter::All), expected);
        assert_eq!(summary.average_task_duration(TaskFilter::All), Ok(expected));
        assert_eq!(
            summary.longest_task(TaskFilter::All).unwrap().task_id(),
            "3fa8c2d1"
        );
    }

    #[test]
    fn test_failed_and_succeeded_split() {
        let summary = summary(&[
            ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:02.000", 0),
            ("bb/000002", "Jan-05 10:00:00.000", "Jan-05 10:00:10.000", 1),
        ]);

        assert_eq!(
            summary.total_cpu_time(TaskFilter::OnlyFailed),
            Duration::from_secs(10)
        );
        assert_eq!(
            summary.total_cpu_time(TaskFilter::OnlySucceeded),
            Duration::from_secs(2)
        );
        assert_eq!(
            summary.longest_task(TaskFilter::All).unwrap().task_id(),
            "bb000002"
        );
        assert_eq!(summary.task_count(TaskFilter::OnlyFailed), 1);
    }

    #[test]
    fn test_cpu_time_is_exact_sum() {
        let summary = summary(&[
            ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:01.125", 0),
            ("bb/000002", "Jan-05 10:00:00.500", "Jan-05 10:01:00.500", 0),
            ("cc/000003", "Jan-05 10:00:01.000", "Jan-05 10:00:01.001", 3),
        ]);

        let expected = Duration::from_millis(1125) + Duration::from_secs(60) + Duration::from_millis(1);
        assert_eq!(summary.total_cpu_time(TaskFilter::All), expected);
    }

    #[test]
    fn test_longest_task_no_match_is_distinct() {
        let summary = summary(&[("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:02.000", 0)]);

        assert_eq!(
            summary.longest_task(TaskFilter::OnlyFailed).unwrap_err(),
            StatsError::NoMatchingTasks(TaskFilter::OnlyFailed)
        );
    }

    #[test]
    fn test_average_no_match() {
        let summary = summary(&[]);
        assert_eq!(
            summary.average_task_duration(TaskFilter::All),
            Err(StatsError::NoMatchingTasks(TaskFilter::All))
        );
        assert_eq!(summary.total_cpu_time(TaskFilter::All), Duration::ZERO);
    }

    #[test]
    fn test_longest_task_tie_keeps_first() {
        let summary = summary(&[
            ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:03.000", 0),
            ("bb/000002", "Jan-05 10:00:01.000", "Jan-05 10:00:04.000", 0),
        ]);
        assert_eq!(
            summary.longest_task(TaskFilter::All).unwrap().task_id(),
            "aa000001"
        );
    }

    #[test]
    fn test_average_duration() {
        let summary = summary(&[
            ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:01.000", 0),
            ("bb/000002", "Jan-05 10:00:00.000", "Jan-05 10:00:02.000", 0),
        ]);
        assert_eq!(
            summary.average_task_duration(TaskFilter::All),
            Ok(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_wall_time_is_not_task_sum() {
        let summary = summary(&[
            ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:01.000", 0),
            ("bb/000002", "Jan-05 10:00:00.000", "Jan-05 10:00:01.000", 0),
        ]);
        // fixture run spans 09:59:59 to 10:05:00
        assert_eq!(summary.total_wall_time(), Duration::from_secs(301));
    }

    #[test]
    fn test_filter_display() {
        assert_eq!(TaskFilter::All.to_string(), "all");
        assert_eq!(TaskFilter::OnlySucceeded.to_string(), "only-succeeded");
    }
}
