//! Human and machine output for salesboard commands.
//!
//! Every command result is either a [`HumanOutput`] block or, with `--json`,
//! an envelope tagged by `status`. One-shot commands pretty-print their
//! envelope; the shell streams one compact envelope per line.

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "salesboard.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
    /// One envelope per line instead of pretty-printed JSON.
    pub stream: bool,
}

/// A titled block: aligned key/value summary, free-form rows, then
/// warnings and suggested next steps.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_row(&mut self, row: impl Into<String>) {
        self.rows.push(row.into());
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn push_next_step(&mut self, step: impl Into<String>) {
        self.next_steps.push(step.into());
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    #[serde(flatten)]
    outcome: Outcome<'a, T>,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome<'a, T: Serialize> {
    Success { data: &'a T },
    Error { error: ErrorBody },
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps): (&[String], &[String]) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (Default::default(), Default::default()),
        };
        return write_envelope(
            options,
            &Envelope {
                schema_version: SCHEMA_VERSION,
                command,
                outcome: Outcome::Success { data },
                warnings,
                next_steps,
            },
        );
    }

    if let (false, Some(human)) = (options.quiet, human) {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report a failed command. Human errors always go to stderr, even when
/// quiet.
pub fn emit_error(options: OutputOptions, command: &str, err: &Error) -> Result<()> {
    let next_steps = error_next_steps(err);
    if options.json {
        let outcome: Outcome<'_, ()> = Outcome::Error {
            error: ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
        };
        return write_envelope(
            options,
            &Envelope {
                schema_version: SCHEMA_VERSION,
                command,
                outcome,
                warnings: &[],
                next_steps: &next_steps,
            },
        );
    }

    eprintln!("error: {err}");
    for step in &next_steps {
        eprintln!("hint: {step}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    let width = output
        .summary
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    for (key, value) in &output.summary {
        if value.is_empty() {
            lines.push(format!("  {key}"));
        } else {
            lines.push(format!("  {key:<width$}  {value}"));
        }
    }

    if !output.rows.is_empty() {
        lines.push(String::new());
        lines.extend(output.rows.iter().map(|row| format!("  {row}")));
    }

    if !output.warnings.is_empty() || !output.next_steps.is_empty() {
        lines.push(String::new());
        lines.extend(output.warnings.iter().map(|warning| format!("warning: {warning}")));
        lines.extend(output.next_steps.iter().map(|step| format!("next: {step}")));
    }

    lines.join("\n")
}

/// First positional argument, used to label errors raised before or
/// during argument parsing.
pub fn infer_command_name_from_args() -> String {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with('-'))
        .unwrap_or_else(|| "salesboard".to_string())
}

fn write_envelope<T: Serialize>(options: OutputOptions, envelope: &Envelope<'_, T>) -> Result<()> {
    let rendered = if options.stream {
        serde_json::to_string(envelope)?
    } else {
        serde_json::to_string_pretty(envelope)?
    };
    println!("{rendered}");
    Ok(())
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        exit_codes::EDIT_REJECTED => "edit_rejected",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) => vec!["list".to_string()],
        Error::EditRejected(_) => {
            vec!["edit <id> <revenue> <time> with both values above 0".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix .salesboard.toml then retry".to_string()],
        Error::LoadFailed(_) => vec!["set loader.fallback_count above 0".to_string()],
        _ => Vec::new(),
    }
}
