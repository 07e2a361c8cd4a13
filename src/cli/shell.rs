//! salesboard shell command
//!
//! Reads one command per line and applies it to a single in-memory store.
//! Each command prints its own result; a failing line is reported and the
//! shell moves on to the next one.

use std::io::BufRead;

use serde_json::{json, Value};

use crate::derive::with_derived;
use crate::edit::{apply_edit, TaskEdit};
use crate::error::{Error, Result};
use crate::insights::{cycle_days, format_roi, Insights};
use crate::output::{emit_error, emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;
use crate::task::{TaskInput, TaskPatch};

use super::report::insights_output;
use super::{describe_status, push_metrics, task_line, BoardOptions};

const HELP: &[&str] = &[
    "add <title> [revenue=N] [time=N] [priority=High|Medium|Low] [status=Todo|\"In Progress\"|Done] [notes=..]",
    "update <id> key=value...",
    "edit <id> <revenue> <time> [notes]",
    "delete <id>",
    "undo",
    "dismiss",
    "show <id>",
    "list",
    "metrics",
    "insights",
    "status",
    "quit",
];

#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Add(TaskInput),
    Update { id: String, patch: TaskPatch },
    Edit {
        id: String,
        revenue: f64,
        time_taken: f64,
        notes: Option<String>,
    },
    Delete(String),
    Undo,
    Dismiss,
    Show(String),
    List,
    Metrics,
    Insights,
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    fn verb(&self) -> &'static str {
        match self {
            ShellCommand::Add(_) => "add",
            ShellCommand::Update { .. } => "update",
            ShellCommand::Edit { .. } => "edit",
            ShellCommand::Delete(_) => "delete",
            ShellCommand::Undo => "undo",
            ShellCommand::Dismiss => "dismiss",
            ShellCommand::Show(_) => "show",
            ShellCommand::List => "list",
            ShellCommand::Metrics => "metrics",
            ShellCommand::Insights => "insights",
            ShellCommand::Status => "status",
            ShellCommand::Help => "help",
            ShellCommand::Quit => "quit",
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    store: TaskStore,
    undo_timeout: chrono::Duration,
    output: OutputOptions,
}

pub fn run<R: BufRead>(options: BoardOptions, input: R) -> Result<()> {
    let board = options.bootstrap()?;
    let output = OutputOptions {
        stream: true,
        ..options.output()
    };

    let mut human = HumanOutput::new(format!(
        "salesboard shell: {}",
        describe_status(&board.status)
    ));
    human.push_next_step("help");
    emit_success(output, "shell", &json!({ "load": board.status }), Some(&human))?;

    let mut session = Session {
        store: board.store,
        undo_timeout: board.config.undo.timeout(),
        output,
    };

    for line in input.lines() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                emit_error(output, "shell", &err)?;
                continue;
            }
        };

        let name = format!("shell {}", command.verb());
        session.store.expire_stale_undo(session.undo_timeout);
        match session.execute(command, &name) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => emit_error(output, &name, &err)?,
        }
    }

    Ok(())
}

impl Session {
    fn execute(&mut self, command: ShellCommand, name: &str) -> Result<Flow> {
        match command {
            ShellCommand::Add(input) => {
                let derived = with_derived(self.store.add_task(input));
                let mut human = HumanOutput::new(format!("Added {}", derived.task.id));
                human.push_row(task_line(&derived));
                emit_success(self.output, name, &derived, Some(&human))?;
            }
            ShellCommand::Update { id, patch } => {
                let derived = self
                    .store
                    .update_task(&id, patch)
                    .map(with_derived)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                let mut human = HumanOutput::new(format!("Updated {id}"));
                human.push_row(task_line(&derived));
                emit_success(self.output, name, &derived, Some(&human))?;
            }
            ShellCommand::Edit {
                id,
                revenue,
                time_taken,
                notes,
            } => {
                // Without notes on the line the current notes are kept.
                let notes =
                    notes.or_else(|| self.store.find(&id).and_then(|task| task.notes.clone()));
                let edit = TaskEdit {
                    revenue,
                    time_taken,
                    notes,
                };
                let derived = with_derived(apply_edit(&mut self.store, &id, edit)?);
                let mut human = HumanOutput::new(format!("Edited {id}"));
                human.push_row(task_line(&derived));
                emit_success(self.output, name, &derived, Some(&human))?;
            }
            ShellCommand::Delete(id) => {
                let deleted = self
                    .store
                    .delete_task(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                let mut human = HumanOutput::new(format!("Deleted {}", deleted.title));
                human.push_next_step("undo");
                human.push_next_step("dismiss");
                let data = json!({
                    "deleted": deleted,
                    "undo": self.store.undo_state(),
                });
                emit_success(self.output, name, &data, Some(&human))?;
            }
            ShellCommand::Undo => {
                let restored = self.store.undo_delete().map(with_derived);
                let human = match &restored {
                    Some(derived) => {
                        let mut human = HumanOutput::new(format!("Restored {}", derived.task.id));
                        human.push_row(task_line(derived));
                        human
                    }
                    None => HumanOutput::new("Nothing to undo"),
                };
                emit_success(self.output, name, &json!({ "restored": restored }), Some(&human))?;
            }
            ShellCommand::Dismiss => {
                self.store.dismiss_undo();
                let human = HumanOutput::new("Undo dismissed");
                let data = json!({ "undo": self.store.undo_state() });
                emit_success(self.output, name, &data, Some(&human))?;
            }
            ShellCommand::Show(id) => {
                let task = self
                    .store
                    .find(&id)
                    .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
                let derived = with_derived(task);
                let cycle = derived
                    .task
                    .completed_at
                    .map(|completed| cycle_days(derived.task.created_at, completed));

                let mut human = HumanOutput::new(derived.task.title.clone());
                human.push_summary("Id", derived.task.id.clone());
                human.push_summary("Priority", derived.task.priority.as_str());
                human.push_summary("Status", derived.task.status.as_str());
                human.push_summary("Revenue", format!("{:.2}", derived.task.revenue));
                human.push_summary("Time taken", format!("{:.1}h", derived.task.time_taken));
                human.push_summary("ROI", format_roi(derived.roi));
                human.push_summary("Created", derived.task.created_at.to_rfc3339());
                if let Some(days) = cycle {
                    human.push_summary("Cycle", format!("{days} days"));
                }
                if let Some(notes) = &derived.task.notes {
                    human.push_row(notes.clone());
                }

                let mut data = serde_json::to_value(&derived)?;
                if let (Some(days), Some(map)) = (cycle, data.as_object_mut()) {
                    map.insert("cycleDays".to_string(), json!(days));
                }
                emit_success(self.output, name, &data, Some(&human))?;
            }
            ShellCommand::List => {
                let tasks = self.store.derived_sorted();
                let mut human = HumanOutput::new(format!("{} tasks", tasks.len()));
                for derived in &tasks {
                    human.push_row(task_line(derived));
                }
                emit_success(self.output, name, &tasks, Some(&human))?;
            }
            ShellCommand::Metrics => {
                let metrics = self.store.metrics();
                let mut human = HumanOutput::new("Metrics");
                push_metrics(&mut human, &metrics);
                emit_success(self.output, name, &metrics, Some(&human))?;
            }
            ShellCommand::Insights => {
                let insights = Insights::compute(&self.store.derived_sorted());
                let human = insights_output("Insights".to_string(), &insights);
                emit_success(self.output, name, &insights, Some(&human))?;
            }
            ShellCommand::Status => {
                let mut human = HumanOutput::new(format!("{} tasks", self.store.len()));
                if let Some(task) = self.store.last_deleted() {
                    human.push_summary("Undo available", task.title.clone());
                }
                let data = json!({
                    "count": self.store.len(),
                    "undo": self.store.undo_state(),
                    "undoVisible": self.store.undo_visible(),
                    "lastDeleted": self.store.last_deleted(),
                });
                emit_success(self.output, name, &data, Some(&human))?;
            }
            ShellCommand::Help => {
                let mut human = HumanOutput::new("Commands");
                for line in HELP {
                    human.push_row(*line);
                }
                emit_success(self.output, name, &HELP, Some(&human))?;
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = tokenize(trimmed)?.into_iter();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<String> = tokens.collect();

    let command = match verb.to_lowercase().as_str() {
        "add" => ShellCommand::Add(parse_add(args)),
        "update" => parse_update(args)?,
        "edit" => parse_edit(args)?,
        "delete" | "rm" => ShellCommand::Delete(single_id("delete", args)?),
        "undo" => ShellCommand::Undo,
        "dismiss" => ShellCommand::Dismiss,
        "show" => ShellCommand::Show(single_id("show", args)?),
        "list" | "ls" => ShellCommand::List,
        "metrics" => ShellCommand::Metrics,
        "insights" => ShellCommand::Insights,
        "status" => ShellCommand::Status,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => {
            return Err(Error::InvalidArgument(format!(
                "unknown shell command: {other}"
            )))
        }
    };
    Ok(Some(command))
}

/// Split on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return Err(Error::InvalidArgument("unterminated quote".to_string()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// `key=value` with a known task field name.
fn split_field(token: &str) -> Option<(&'static str, Value)> {
    let (key, value) = token.split_once('=')?;
    let field = match key.trim().to_lowercase().as_str() {
        "id" => "id",
        "title" => "title",
        "revenue" => "revenue",
        "time" | "timetaken" | "time_taken" => "time",
        "priority" => "priority",
        "status" => "status",
        "notes" => "notes",
        _ => return None,
    };
    Some((field, Value::String(value.to_string())))
}

fn parse_add(args: Vec<String>) -> TaskInput {
    let mut input = TaskInput::default();
    let mut words = Vec::new();
    for arg in args {
        match split_field(&arg) {
            Some(("id", value)) => input.id = Some(value),
            Some(("title", value)) => input.title = Some(value),
            Some(("revenue", value)) => input.revenue = Some(value),
            Some(("time", value)) => input.time_taken = Some(value),
            Some(("priority", value)) => input.priority = Some(value),
            Some(("status", value)) => input.status = Some(value),
            Some(("notes", value)) => input.notes = Some(value),
            _ => words.push(arg),
        }
    }
    if input.title.is_none() && !words.is_empty() {
        input.title = Some(Value::String(words.join(" ")));
    }
    input
}

fn parse_update(args: Vec<String>) -> Result<ShellCommand> {
    let mut args = args.into_iter();
    let id = args
        .next()
        .ok_or_else(|| Error::InvalidArgument("usage: update <id> key=value...".to_string()))?;

    let mut patch = TaskPatch::new();
    for arg in args {
        match split_field(&arg) {
            Some(("title", value)) => patch.title = Some(value),
            Some(("revenue", value)) => patch.revenue = Some(value),
            Some(("time", value)) => patch.time_taken = Some(value),
            Some(("priority", value)) => patch.priority = Some(value),
            Some(("status", value)) => patch.status = Some(value),
            Some(("notes", value)) => patch.notes = Some(value),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "cannot update with '{arg}'"
                )))
            }
        }
    }
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "update needs at least one key=value".to_string(),
        ));
    }
    Ok(ShellCommand::Update { id, patch })
}

fn parse_edit(args: Vec<String>) -> Result<ShellCommand> {
    let usage = || Error::InvalidArgument("usage: edit <id> <revenue> <time> [notes]".to_string());
    let mut args = args.into_iter();
    let id = args.next().ok_or_else(usage)?;
    let revenue = parse_amount(&args.next().ok_or_else(usage)?, "revenue")?;
    let time_taken = parse_amount(&args.next().ok_or_else(usage)?, "time")?;
    let rest: Vec<String> = args.collect();
    let notes = (!rest.is_empty()).then(|| rest.join(" "));
    Ok(ShellCommand::Edit {
        id,
        revenue,
        time_taken,
        notes,
    })
}

fn parse_amount(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidArgument(format!("{field} must be a number, got '{raw}'")))
}

fn single_id(verb: &str, args: Vec<String>) -> Result<String> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(id), None) => Ok(id),
        _ => Err(Error::InvalidArgument(format!("usage: {verb} <id>"))),
    }
}
