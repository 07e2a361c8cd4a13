//! Command-line interface for salesboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule; the bootstrap shared by
//! all of them lives here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::derive::DerivedTask;
use crate::error::{Error, Result};
use crate::insights::format_roi;
use crate::loader::{source_for, LoadOutcome, LoadStatus, Loader};
use crate::metrics::Metrics;
use crate::output::{HumanOutput, OutputOptions};
use crate::store::TaskStore;

mod report;
mod shell;

/// salesboard - sales task tracker
///
/// Loads a task list (or generates one), ranks tasks by return on time
/// invested and reports aggregate performance.
#[derive(Parser, Debug)]
#[command(name = "salesboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding .salesboard.toml (defaults to current directory)
    #[arg(long, global = true, env = "SALESBOARD_DIR")]
    pub dir: Option<PathBuf>,

    /// Task list to load: a JSON file path or an http(s) URL
    #[arg(long, global = true, env = "SALESBOARD_SOURCE")]
    pub source: Option<String>,

    /// Seed for generated fallback tasks
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Number of tasks generated when the source cannot be used (0 disables)
    #[arg(long, global = true)]
    pub fallback_count: Option<usize>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show ranked tasks and aggregate metrics
    Report {
        /// Show at most this many tasks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Revenue breakdowns and ROI distribution
    Insights,

    /// Read task commands from stdin and apply them to the loaded tasks
    Shell,
}

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct BoardOptions {
    pub dir: Option<PathBuf>,
    pub source: Option<String>,
    pub seed: Option<u64>,
    pub fallback_count: Option<usize>,
    pub json: bool,
    pub quiet: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let board = BoardOptions {
            dir: self.dir,
            source: self.source,
            seed: self.seed,
            fallback_count: self.fallback_count,
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Report { limit } => {
                report::run_report(report::ReportOptions { board, limit })
            }
            Commands::Insights => report::run_insights(board),
            Commands::Shell => {
                let stdin = std::io::stdin();
                shell::run(board, stdin.lock())
            }
        }
    }
}

/// A loaded board: configuration plus the bootstrapped store.
pub(crate) struct Board {
    pub config: Config,
    pub store: TaskStore,
    pub status: LoadStatus,
}

impl BoardOptions {
    pub(crate) fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
            stream: false,
        }
    }

    fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        })
    }

    /// Load config, apply flag overrides and run the bootstrap once.
    pub(crate) fn bootstrap(&self) -> Result<Board> {
        let dir = self.resolve_dir();
        let mut config = Config::load_from_dir(&dir);
        if let Some(source) = &self.source {
            if source.trim().is_empty() {
                return Err(Error::InvalidArgument("--source cannot be empty".to_string()));
            }
            config.loader.source = Some(source.clone());
        }
        if let Some(seed) = self.seed {
            config.loader.seed = seed;
        }
        if let Some(count) = self.fallback_count {
            config.loader.fallback_count = count;
        }

        let source = config
            .loader
            .source
            .as_deref()
            .map(|location| {
                source_for(
                    &resolve_location(&dir, location),
                    Duration::from_millis(config.loader.timeout_ms),
                )
            })
            .transpose()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut loader = Loader::new(&config.loader);
        let outcome = runtime.block_on(async {
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });
            let outcome = loader.load(source.as_deref(), &cancel).await;
            interrupt.abort();
            outcome
        })?;

        let tasks = match outcome {
            LoadOutcome::Loaded { tasks, .. } => tasks,
            LoadOutcome::Cancelled | LoadOutcome::AlreadyLoaded => {
                return Err(Error::LoadFailed("bootstrap interrupted".to_string()));
            }
        };

        Ok(Board {
            config,
            store: TaskStore::new().with_tasks(tasks),
            status: loader.status().clone(),
        })
    }
}

/// Relative file sources resolve against the board directory.
fn resolve_location(dir: &Path, location: &str) -> String {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    let path = Path::new(location);
    if path.is_absolute() {
        location.to_string()
    } else {
        dir.join(path).display().to_string()
    }
}

pub(crate) fn describe_status(status: &LoadStatus) -> String {
    match status {
        LoadStatus::Idle => "idle".to_string(),
        LoadStatus::Loading => "loading".to_string(),
        LoadStatus::Loaded { count, origin } => {
            format!("{count} tasks ({origin:?})").to_lowercase()
        }
        LoadStatus::Failed { message } => format!("failed: {message}"),
    }
}

pub(crate) fn task_line(derived: &DerivedTask) -> String {
    let task = &derived.task;
    format!(
        "{} {} [{} / {}] revenue {:.2}, time {:.1}h, roi {}",
        task.id,
        task.title,
        task.priority,
        task.status,
        task.revenue,
        task.time_taken,
        format_roi(derived.roi)
    )
}

pub(crate) fn push_metrics(output: &mut HumanOutput, metrics: &Metrics) {
    output.push_summary("Total revenue", format!("{:.2}", metrics.total_revenue));
    output.push_summary("Total time", format!("{:.1}h", metrics.total_time_taken));
    output.push_summary("Time efficiency", format!("{:.1}%", metrics.time_efficiency_pct));
    output.push_summary("Revenue per hour", format!("{:.2}", metrics.revenue_per_hour));
    output.push_summary("Average ROI", format!("{:.2}", metrics.average_roi));
    output.push_summary("Grade", metrics.performance_grade.as_str());
}
