//! Run Reports
//!
//! Human-readable and JSON renderings of a [`RunSummary`].

use std::time::Duration;

use colored::Colorize;
use serde::Serialize;

use super::record::TaskRecord;
use super::stats::TaskFilter;
use super::summary::RunSummary;

/// Width of the timeline bars in characters.
const CHART_WIDTH: f64 = 50.0;

/// Statistics for one filter, ready for serialization.
#[derive(Debug, Serialize)]
pub struct FilteredStats<'a> {
    pub filter: TaskFilter,
    pub task_count: usize,
    pub cpu_time_secs: f64,
    pub average_secs: Option<f64>,
    pub longest_task: Option<&'a str>,
}

impl<'a> FilteredStats<'a> {
    pub fn compute(summary: &'a RunSummary, filter: TaskFilter) -> Self {
        Self {
            filter,
            task_count: summary.task_count(filter),
            cpu_time_secs: summary.total_cpu_time(filter).as_secs_f64(),
            average_secs: summary
                .average_task_duration(filter)
                .ok()
                .map(|d| d.as_secs_f64()),
            longest_task: summary.longest_task(filter).ok().map(TaskRecord::task_id),
        }
    }
}

/// Machine-readable report: the summary plus statistics for one filter.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub wall_time_secs: f64,
    pub stats: FilteredStats<'a>,
    pub summary: &'a RunSummary,
}

impl<'a> JsonReport<'a> {
    pub fn new(summary: &'a RunSummary, filter: TaskFilter) -> Self {
        Self {
            wall_time_secs: summary.total_wall_time().as_secs_f64(),
            stats: FilteredStats::compute(summary, filter),
            summary,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Renders the text summary shown by `nfbatch analyze`.
pub fn render_summary(summary: &RunSummary, filter: TaskFilter) -> String {
    let mut output = String::new();

    output.push_str(&format!("Launcher: {}\n", summary.launcher_command()));
    output.push_str(&format!(
        "Run: {} -> {}\n",
        summary.run_start(),
        summary.run_end()
    ));
    output.push_str(&format!(
        "Wall time: {}\n",
        format_duration(summary.total_wall_time())
    ));

    let failed = summary.task_count(TaskFilter::OnlyFailed);
    let tasks_line = format!(
        "Tasks: {} ({} succeeded, {} failed)",
        summary.len(),
        summary.len() - failed,
        failed
    );
    if failed > 0 {
        output.push_str(&format!("{}\n", tasks_line.yellow()));
    } else {
        output.push_str(&format!("{}\n", tasks_line));
    }

    if !summary.excluded_task_ids().is_empty() {
        output.push_str(&format!(
            "{}\n",
            format!(
                "Excluded (incomplete): {}",
                summary.excluded_task_ids().join(", ")
            )
            .yellow()
        ));
    }

    output.push_str(&format!("\nFilter: {}\n", filter));
    output.push_str(&format!(
        "  CPU time: {}\n",
        format_duration(summary.total_cpu_time(filter))
    ));

    match summary.average_task_duration(filter) {
        Ok(avg) => output.push_str(&format!("  Average task: {}\n", format_duration(avg))),
        Err(e) => output.push_str(&format!("  Average task: n/a ({})\n", e)),
    }

    match summary.longest_task(filter) {
        Ok(task) => output.push_str(&format!(
            "  Longest task: {} {} ({})\n",
            task.task_id(),
            task.name(),
            format_duration(task.duration())
        )),
        Err(e) => output.push_str(&format!("  Longest task: n/a ({})\n", e)),
    }

    let failed_tasks: Vec<&TaskRecord> = summary.filtered(TaskFilter::OnlyFailed).collect();
    if !failed_tasks.is_empty() {
        output.push_str(&format!("\n{}\n", "Failed tasks:".red().bold()));
        for task in failed_tasks {
            output.push_str(&format!(
                "  {} {} exit {} ({})\n",
                task.task_id(),
                task.name(),
                task.exit_code(),
                task.work_dir().display()
            ));
        }
    }

    output
}

/// Draws an ASCII timeline of task spans relative to the run.
///
/// Each task is a bar placed where it ran inside the run's wall time.
pub fn timeline_chart(summary: &RunSummary, filter: TaskFilter) -> String {
    let mut output = String::from("\nTask Timeline:\n\n");

    let total_ms = summary.total_wall_time().as_millis();
    if total_ms == 0 {
        return output;
    }

    let scale = CHART_WIDTH / total_ms as f64;

    let mut tasks: Vec<&TaskRecord> = summary.filtered(filter).collect();
    tasks.sort_by_key(|task| task.start());

    for task in tasks {
        let offset_ms = (task.start() - summary.run_start())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .as_millis();
        let duration_ms = task.duration().as_millis();

        let start_pos = (offset_ms as f64 * scale) as usize;
        let width = (duration_ms as f64 * scale).max(1.0) as usize;

        let mut bar = " ".repeat(start_pos);
        bar.push_str(&"#".repeat(width));

        let line = format!(
            "{:12} |{}| ({} ms)",
            truncate(task.task_id(), 12),
            bar,
            duration_ms
        );
        if task.succeeded() {
            output.push_str(&line);
        } else {
            output.push_str(&line.red().to_string());
        }
        output.push('\n');
    }

    output.push_str(&format!("\nTotal: {} ms\n", total_ms));
    output
}

/// Formats a duration as `1h 02m 03.450s`, dropping leading zero units.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) as f64 / 1000.0;

    if hours > 0 {
        format!("{}h {:02}m {:06.3}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:06.3}s", minutes, seconds)
    } else {
        format!("{:.3}s", seconds)
    }
}

/// Pads or truncates a string to a fixed width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::standard_log;
    use crate::analysis::{parse_log, IncompletePolicy};

    fn two_task_summary() -> RunSummary {
        let log = standard_log(
            2021,
            &[
                ("aa/000001", "Jan-05 10:00:00.000", "Jan-05 10:00:02.000", 0),
                ("bb/000002", "Jan-05 10:00:00.000", "Jan-05 10:00:10.000", 1),
            ],
        );
        parse_log(log.as_bytes(), IncompletePolicy::Strict).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(5250)), "5.250s");
        assert_eq!(format_duration(Duration::from_secs(61)), "1m 01.000s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h 02m 03.000s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc  ");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_render_summary_mentions_failures() {
        let summary = two_task_summary();
        let text = render_summary(&summary, TaskFilter::All);

        assert!(text.contains("nextflow /proj/script.nf"));
        assert!(text.contains("1 succeeded, 1 failed"));
        assert!(text.contains("Longest task: bb000002"));
        assert!(text.contains("Failed tasks:"));
        assert!(text.contains("exit 1"));
    }

    #[test]
    fn test_render_summary_empty_filter() {
        let summary = two_task_summary();
        let text = render_summary(&summary, TaskFilter::OnlySucceeded);
        assert!(text.contains("Longest task: aa000001"));

        let log = standard_log(2021, &[]);
        let empty = parse_log(log.as_bytes(), IncompletePolicy::Strict).unwrap();
        let text = render_summary(&empty, TaskFilter::All);
        assert!(text.contains("Longest task: n/a"));
    }

    #[test]
    fn test_timeline_chart() {
        let summary = two_task_summary();
        let chart = timeline_chart(&summary, TaskFilter::All);

        assert!(chart.contains("aa000001"));
        assert!(chart.contains("bb000002"));
        assert!(chart.contains("(10000 ms)"));
        assert!(chart.contains("Total: 301000 ms"));
    }

    #[test]
    fn test_timeline_chart_respects_filter() {
        let summary = two_task_summary();
        let chart = timeline_chart(&summary, TaskFilter::OnlySucceeded);
        assert!(chart.contains("aa000001"));
        assert!(!chart.contains("bb000002"));
    }

    #[test]
    fn test_json_report() {
        let summary = two_task_summary();
        let json = JsonReport::new(&summary, TaskFilter::OnlyFailed)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["stats"]["filter"], "only-failed");
        assert_eq!(value["stats"]["task_count"], 1);
        assert_eq!(value["stats"]["cpu_time_secs"], 10.0);
        assert_eq!(value["stats"]["longest_task"], "bb000002");
        assert_eq!(value["summary"]["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(value["wall_time_secs"], 301.0);
    }
}
