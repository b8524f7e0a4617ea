//! Pipeline Generation
//!
//! Renders the two files the engine is started with: a pipeline script
//! that runs every job-list line as one task, and a configuration file
//! carrying executor and resource settings.

use std::path::Path;

use crate::config::{Executor, NextflowConfig};

pub const SCRIPT_FILE: &str = "script.nf";
pub const CONFIG_FILE: &str = "config.nf";

/// Process name that shows up in every task line of the engine log.
pub const PROCESS_NAME: &str = "execute_jobs";

/// Quotes a value as a single-quoted Groovy string.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Renders `script.nf`.
pub fn render_script(project_name: &str, joblist: &Path, config: &NextflowConfig) -> String {
    let mut script = format!("// generated by nfbatch for project {}\n", project_name);

    script.push_str("nextflow.enable.dsl=1\n\n");
    script.push_str(&format!(
        "joblist_path = {}\n",
        quote(&joblist.display().to_string())
    ));
    script.push_str("joblist = file(joblist_path)\n");
    script.push_str("lines = Channel.from(joblist.readLines())\n\n");

    script.push_str(&format!("process {} {{\n", PROCESS_NAME));
    script.push_str(&format!(
        "    errorStrategy {}\n",
        quote(&config.error_strategy.to_string())
    ));
    script.push_str(&format!("    maxRetries {}\n\n", config.max_retries));
    script.push_str("    input:\n");
    script.push_str("    val line from lines\n\n");
    script.push_str("    \"${line}\"\n");
    script.push_str("}\n");

    script
}

/// Renders `config.nf` for the executor that will actually be used.
pub fn render_config(project_name: &str, executor: Executor, config: &NextflowConfig) -> String {
    let memory = if config.retry_increase_memory {
        format!("{{ {} * task.attempt }}", config.memory.to_literal())
    } else {
        quote(&config.memory.to_string())
    };

    let time = if config.retry_increase_time {
        format!("{{ {} * task.attempt }}", config.time.to_literal())
    } else {
        quote(&config.time.to_string())
    };

    let mut rendered = format!("// generated by nfbatch for project {}\n", project_name);
    rendered.push_str(&format!("process.executor = {}\n", quote(executor.as_str())));
    rendered.push_str(&format!("process.queue = {}\n", quote(&config.queue)));
    rendered.push_str(&format!("process.memory = {}\n", memory));
    rendered.push_str(&format!("process.time = {}\n", time));
    rendered.push_str(&format!("process.cpus = {}\n", config.cpus));
    if let Some(options) = &config.cluster_options {
        rendered.push_str(&format!("process.clusterOptions = {}\n", quote(options)));
    }
    rendered.push_str(&format!("executor.queueSize = {}\n", config.queue_size));

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorStrategy;

    #[test]
    fn test_script_reads_joblist() {
        let config = NextflowConfig::default();
        let script = render_script("demo", Path::new("/proj/demo/joblist.txt"), &config);

        assert!(script.contains("nextflow.enable.dsl=1"));
        assert!(script.contains("joblist_path = '/proj/demo/joblist.txt'"));
        assert!(script.contains("lines = Channel.from(joblist.readLines())"));
        assert!(script.contains("process execute_jobs {"));
        assert!(script.contains("    errorStrategy 'retry'"));
        assert!(script.contains("    maxRetries 3"));
        assert!(script.contains("    \"${line}\""));
        assert!(script.ends_with("}\n"));
    }

    #[test]
    fn test_script_layout() {
        let config = NextflowConfig::default();
        let script = render_script("demo", Path::new("/j.txt"), &config);

        assert_eq!(
            script,
            "// generated by nfbatch for project demo\n\
             nextflow.enable.dsl=1\n\
             \n\
             joblist_path = '/j.txt'\n\
             joblist = file(joblist_path)\n\
             lines = Channel.from(joblist.readLines())\n\
             \n\
             process execute_jobs {\n    \
             errorStrategy 'retry'\n    \
             maxRetries 3\n\
             \n    \
             input:\n    \
             val line from lines\n\
             \n    \
             \"${line}\"\n\
             }\n"
        );
    }

    #[test]
    fn test_script_error_strategy() {
        let config = NextflowConfig {
            error_strategy: ErrorStrategy::Ignore,
            max_retries: 0,
            ..NextflowConfig::default()
        };
        let script = render_script("demo", Path::new("j.txt"), &config);
        assert!(script.contains("errorStrategy 'ignore'"));
        assert!(script.contains("maxRetries 0"));
    }

    #[test]
    fn test_default_config() {
        let config = NextflowConfig::default();
        let rendered = render_config("demo", Executor::Local, &config);

        assert_eq!(
            rendered,
            "// generated by nfbatch for project demo\n\
             process.executor = 'local'\n\
             process.queue = 'batch'\n\
             process.memory = '10 GB'\n\
             process.time = '1h'\n\
             process.cpus = 1\n\
             executor.queueSize = 100\n"
        );
    }

    #[test]
    fn test_retry_escalation_and_cluster_options() {
        let config = NextflowConfig {
            retry_increase_memory: true,
            retry_increase_time: true,
            cluster_options: Some("--account=lab".to_string()),
            ..NextflowConfig::default()
        };
        let rendered = render_config("demo", Executor::Slurm, &config);

        assert!(rendered.contains("process.executor = 'slurm'"));
        assert!(rendered.contains("process.memory = { 10.GB * task.attempt }"));
        assert!(rendered.contains("process.time = { 1.h * task.attempt }"));
        assert!(rendered.contains("process.clusterOptions = '--account=lab'"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b"), "'a\\\\b'");
    }
}
