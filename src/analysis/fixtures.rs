//! Synthetic `.nextflow.log` content for tests.

pub(crate) const RUN_START: &str = "Jan-05 09:59:59.000";
pub(crate) const RUN_END: &str = "Jan-05 10:05:00.000";

pub(crate) fn launcher(stamp: &str) -> String {
    format!(
        "{} [main] DEBUG nextflow.cli.Launcher - $> nextflow /proj/script.nf -c /proj/config.nf",
        stamp
    )
}

pub(crate) fn header(year: i32) -> String {
    format!(
        "{} [main] DEBUG nextflow.cli.CmdRun - \n  Version: 20.10.0 build 5430\n  Created: 01-11-{} 21:04 UTC (22:04 CEST)\n  System: Linux 5.4.0",
        RUN_START, year
    )
}

/// `hash` is the short form, e.g. `3f/a8c2d1`.
pub(crate) fn submitted(stamp: &str, hash: &str) -> String {
    format!(
        "{} [Task submitter] INFO  nextflow.Session - [{}] Submitted process > execute_jobs (1)",
        stamp, hash
    )
}

/// Submission line the engine writes for a retried task.
pub(crate) fn resubmitted(stamp: &str, hash: &str) -> String {
    format!(
        "{} [Task submitter] INFO  nextflow.Session - [{}] Re-submitted process > execute_jobs (1)",
        stamp, hash
    )
}

/// `hash` is the short form; the work directory gets a longer suffix
/// the way the engine writes it.
pub(crate) fn completed(stamp: &str, hash: &str, exit: i32) -> String {
    format!(
        "{} [Task monitor] DEBUG n.processor.TaskPollingMonitor - Task completed > TaskHandler[id: 1; name: execute_jobs (1); status: COMPLETED; exit: {}; error: -; workDir: /proj/work/{}9b0c7e4f2a]",
        stamp, exit, hash
    )
}

pub(crate) fn goodbye(stamp: &str) -> String {
    format!(
        "{} [main] DEBUG nextflow.script.ScriptRunner - > Execution complete -- Goodbye",
        stamp
    )
}

/// A synthetic task: short hash, start stamp, end stamp, exit code.
pub(crate) type TaskSpec<'a> = (&'a str, &'a str, &'a str, i32);

/// Builds a well-formed log: launcher, header, all submissions, all
/// completions, then the completion line.
pub(crate) fn standard_log(year: i32, tasks: &[TaskSpec<'_>]) -> String {
    let mut lines = vec![
        launcher(RUN_START),
        header(year),
        format!(
            "{} [main] INFO  nextflow.cli.CmdRun - N E X T F L O W  ~  version 20.10.0",
            RUN_START
        ),
    ];
    for (hash, start, _, _) in tasks {
        lines.push(submitted(start, hash));
    }
    for (hash, _, end, exit) in tasks {
        lines.push(completed(end, hash, *exit));
    }
    lines.push(goodbye(RUN_END));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
