//! salesboard - sales task tracker CLI
//!
//! Loads a task list, ranks tasks by return on time invested and reports
//! aggregate performance.

use clap::Parser;
use salesboard::cli::Cli;
use salesboard::output::{emit_error, infer_command_name_from_args, OutputOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG and goes to stderr so JSON output stays clean.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let output = OutputOptions {
        json: cli.json,
        ..OutputOptions::default()
    };
    if let Err(err) = cli.run() {
        let _ = emit_error(output, &command, &err);
        std::process::exit(err.exit_code());
    }
}
