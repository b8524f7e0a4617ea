//! Submits a job list to a stand-in engine and analyses the directory it
//! leaves behind.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use nfbatch::analysis::{parse_run_dir, IncompletePolicy, TaskFilter};
use nfbatch::config::NextflowConfig;
use nfbatch::error::AnalysisError;
use nfbatch::submit::{Nextflow, RunStatus};

const RUN_LOG: &str = r#"Mar-14 08:00:00.000 [main] DEBUG nextflow.cli.Launcher - $> nextflow script.nf -c config.nf
Mar-14 08:00:00.100 [main] DEBUG nextflow.cli.CmdRun -
  Version: 20.10.0 build 5430
  Created: 01-11-2020 21:04 UTC (22:04 CEST)
  System: Linux 5.4.0
Mar-14 08:00:01.000 [Task submitter] INFO  nextflow.Session - [1a/2b3c4d] Submitted process > execute_jobs (1)
Mar-14 08:00:01.200 [Task submitter] INFO  nextflow.Session - [5e/6f7a8b] Submitted process > execute_jobs (2)
Mar-14 08:00:04.000 [Task monitor] DEBUG n.processor.TaskPollingMonitor - Task completed > TaskHandler[id: 1; name: execute_jobs (1); status: COMPLETED; exit: 0; error: -; workDir: /proj/work/1a/2b3c4d5e6f]
Mar-14 08:00:11.200 [Task monitor] DEBUG n.processor.TaskPollingMonitor - Task completed > TaskHandler[id: 2; name: execute_jobs (2); status: COMPLETED; exit: 1; error: -; workDir: /proj/work/5e/6f7a8b9c0d]
Mar-14 08:00:12.000 [main] DEBUG nextflow.script.ScriptRunner - > Execution complete -- Goodbye
"#;

/// Writes an engine stand-in that lays out a finished run in its cwd.
fn fake_engine(dir: &Path, log: &str, exit_code: i32) -> PathBuf {
    let log_path = dir.join("canned.log");
    fs::write(&log_path, log).unwrap();

    let exe = dir.join("nextflow");
    fs::write(
        &exe,
        format!(
            "#!/bin/sh\nmkdir -p work .nextflow\ncp '{}' .nextflow.log\nexit {}\n",
            log_path.display(),
            exit_code
        ),
    )
    .unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    exe
}

fn config_for(dir: &Path, exe: PathBuf) -> NextflowConfig {
    NextflowConfig {
        executable: Some(exe),
        skip_executable_check: true,
        working_dir: Some(dir.to_path_buf()),
        project_name: Some("batch".to_string()),
        ..NextflowConfig::default()
    }
}

#[test]
fn test_run_then_analyze() {
    let dir = TempDir::new().unwrap();
    let exe = fake_engine(dir.path(), RUN_LOG, 0);
    let nextflow = Nextflow::new(config_for(dir.path(), exe)).unwrap();

    let status = nextflow.execute(&["sleep 3", "exit 1"]).unwrap();
    assert_eq!(status, RunStatus::Success);

    let summary = parse_run_dir(nextflow.project_dir(), IncompletePolicy::Strict).unwrap();

    assert_eq!(summary.launcher_command(), "nextflow script.nf -c config.nf");
    assert_eq!(summary.year(), 2020);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary.total_wall_time(), Duration::from_secs(12));
    assert_eq!(
        summary.total_cpu_time(TaskFilter::All),
        Duration::from_secs(13)
    );
    assert_eq!(
        summary.total_cpu_time(TaskFilter::OnlySucceeded),
        Duration::from_secs(3)
    );

    let slowest = summary.longest_task(TaskFilter::All).unwrap();
    assert_eq!(slowest.task_id(), "5e6f7a8b");
    assert_eq!(slowest.exit_code(), 1);
    assert_eq!(slowest.name(), "execute_jobs (2)");
}

#[test]
fn test_engine_failure_keeps_logs() {
    let dir = TempDir::new().unwrap();
    let exe = fake_engine(dir.path(), RUN_LOG, 1);
    let nextflow = Nextflow::new(config_for(dir.path(), exe)).unwrap();

    let status = nextflow.execute(&["exit 1"]).unwrap();
    assert_eq!(status.exit_code(), 1);
    assert!(parse_run_dir(nextflow.project_dir(), IncompletePolicy::Strict).is_ok());
}

#[test]
fn test_analyze_incomplete_run() {
    let truncated: String = RUN_LOG
        .lines()
        .filter(|line| !line.contains("id: 2;"))
        .map(|line| format!("{}\n", line))
        .collect();

    let dir = TempDir::new().unwrap();
    let exe = fake_engine(dir.path(), &truncated, 0);
    let nextflow = Nextflow::new(config_for(dir.path(), exe)).unwrap();
    nextflow.execute(&["true", "true"]).unwrap();

    let err = parse_run_dir(nextflow.project_dir(), IncompletePolicy::Strict).unwrap_err();
    match err {
        AnalysisError::IncompleteTaskRecord { task_ids } => {
            assert_eq!(task_ids, vec!["5e6f7a8b".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }

    let summary = parse_run_dir(nextflow.project_dir(), IncompletePolicy::Ignore).unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary.excluded_task_ids(), ["5e6f7a8b".to_string()]);
}

#[test]
fn test_analyze_rejects_plain_directory() {
    let dir = TempDir::new().unwrap();
    let err = parse_run_dir(dir.path(), IncompletePolicy::Strict).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidRunDirectory { .. }));
}
