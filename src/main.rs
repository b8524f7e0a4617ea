//! nfbatch CLI Entry Point
//!
//! Provides command-line interface for running job lists and analysing
//! finished runs.
//!
//! # Usage
//!
//! ```bash
//! # Run every line of a job list as a Nextflow task
//! nfbatch run jobs.txt
//!
//! # On a cluster, with a config file and a few overrides
//! nfbatch run jobs.txt --config nfbatch.yaml --executor slurm --memory 16G
//!
//! # Summarise a finished run
//! nfbatch analyze nextflow_project_at_1700000000
//!
//! # Only failed tasks, with a timeline chart
//! nfbatch analyze nextflow_project_at_1700000000 --only-failed --chart
//!
//! # Machine-readable output
//! nfbatch analyze nextflow_project_at_1700000000 --json
//! ```
//!
//! # Exit codes
//!
//! - `0`: success
//! - `1`: the engine reported a failed pipeline
//! - `2`: nfbatch itself failed (bad arguments or configuration, missing
//!   scheduler, unreadable or corrupt log)

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{debug, error, info};

use nfbatch::analysis::report::{render_summary, timeline_chart, JsonReport};
use nfbatch::analysis::{parse_run_dir, IncompletePolicy, TaskFilter};
use nfbatch::config::{load_config, Executor, LogRemoval, MemorySize, NextflowConfig, TimeLimit};
use nfbatch::submit::{absolutize_paths, Nextflow};
use nfbatch::{APP_NAME, VERSION};

/// Exit code for errors raised by nfbatch rather than by the engine.
const ERROR_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "nfbatch")]
#[command(version)]
#[command(about = "Run shell job lists with Nextflow and analyse the run logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a job list through Nextflow
    Run(RunArgs),
    /// Summarise a finished run directory
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// File with one shell command per line
    joblist: PathBuf,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// local, slurm, lsf, sge, pbs or pbspro
    #[arg(long)]
    executor: Option<Executor>,

    #[arg(long)]
    queue: Option<String>,

    /// Memory per task, e.g. 10G
    #[arg(long)]
    memory: Option<MemorySize>,

    /// Time limit per task, e.g. 1h
    #[arg(long)]
    time: Option<TimeLimit>,

    #[arg(long)]
    cpus: Option<u32>,

    #[arg(long)]
    queue_size: Option<u32>,

    #[arg(long)]
    max_retries: Option<u32>,

    #[arg(long)]
    project_name: Option<String>,

    /// Directory the project directory is created in
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Path to the Nextflow executable
    #[arg(long)]
    nextflow: Option<PathBuf>,

    /// Skip the `nextflow -v` preflight check
    #[arg(long)]
    no_check: bool,

    /// Use the local executor if the scheduler is not installed
    #[arg(long)]
    switch_to_local: bool,

    /// never, on_success or always
    #[arg(long)]
    remove_logs: Option<LogRemoval>,

    /// Rewrite relative paths in jobs as absolute paths
    #[arg(long)]
    abspaths: bool,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Project directory of a finished run
    run_dir: PathBuf,

    /// Leave out tasks with a missing submission or completion
    #[arg(long)]
    ignore_incomplete: bool,

    #[arg(long)]
    only_failed: bool,

    #[arg(long)]
    only_succeeded: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Append a task timeline chart
    #[arg(long)]
    chart: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Nextflow batch runner");
    println!();
}

/// Layers command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut NextflowConfig, args: &RunArgs) {
    if let Some(executor) = args.executor {
        config.executor = executor;
    }
    if let Some(queue) = &args.queue {
        config.queue = queue.clone();
    }
    if let Some(memory) = args.memory {
        config.memory = memory;
    }
    if let Some(time) = args.time {
        config.time = time;
    }
    if let Some(cpus) = args.cpus {
        config.cpus = cpus;
    }
    if let Some(queue_size) = args.queue_size {
        config.queue_size = queue_size;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(name) = &args.project_name {
        config.project_name = Some(name.clone());
    }
    if let Some(dir) = &args.working_dir {
        config.working_dir = Some(dir.clone());
    }
    if let Some(exe) = &args.nextflow {
        config.executable = Some(exe.clone());
    }
    if let Some(policy) = args.remove_logs {
        config.remove_logs = policy;
    }
    config.skip_executable_check |= args.no_check;
    config.switch_to_local |= args.switch_to_local;
}

/// Reads the job list, skipping blank lines.
fn read_joblist(args: &RunArgs) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(&args.joblist).map_err(|e| {
        format!(
            "Failed to read job list '{}': {}",
            args.joblist.display(),
            e
        )
    })?;

    let jobs: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    if args.abspaths {
        let base = match args.joblist.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        debug!("Resolving job paths against {}", base.display());
        return Ok(absolutize_paths(&jobs, &base));
    }

    Ok(jobs)
}

fn run_jobs(args: RunArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => NextflowConfig::default(),
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    let jobs = read_joblist(&args)?;
    info!("Job list loaded: {} jobs", jobs.len());

    let nextflow = Nextflow::new(config)?;
    debug!("{}", nextflow);

    let status = nextflow.execute(&jobs)?;
    if nextflow.project_dir().exists() {
        info!("Run directory: {}", nextflow.project_dir().display());
    }
    if !status.succeeded() {
        error!("{} jobs submitted, pipeline did not finish cleanly", jobs.len());
    }

    Ok(status.exit_code())
}

fn analyze_run(args: AnalyzeArgs) -> Result<u8, Box<dyn std::error::Error>> {
    let filter = TaskFilter::from_flags(args.only_failed, args.only_succeeded)?;
    let policy = if args.ignore_incomplete {
        IncompletePolicy::Ignore
    } else {
        IncompletePolicy::Strict
    };

    let summary = parse_run_dir(&args.run_dir, policy)?;
    info!("Parsed {} tasks", summary.len());

    if args.json {
        println!("{}", JsonReport::new(&summary, filter).to_json()?);
        return Ok(0);
    }

    print!("{}", render_summary(&summary, filter));
    if args.chart {
        print!("{}", timeline_chart(&summary, filter));
    }

    Ok(0)
}

/// Main application entry point.
fn run() -> Result<u8, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => {
            print_banner();
            run_jobs(args)
        }
        Commands::Analyze(args) => {
            if !args.json {
                print_banner();
            }
            analyze_run(args)
        }
    }
}

/// Maps the outcome of [`run`] to a process exit code, reporting errors.
fn exit_code_for(result: Result<u8, Box<dyn std::error::Error>>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ERROR_EXIT_CODE
        }
    }
}

fn main() -> ExitCode {
    ExitCode::from(exit_code_for(run()))
}
