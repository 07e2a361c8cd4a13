//! salesboard report and insights commands
//!
//! Both bootstrap a fresh board and print read-only views of it.

use serde::Serialize;

use crate::derive::DerivedTask;
use crate::error::Result;
use crate::insights::Insights;
use crate::loader::{LoadOrigin, LoadStatus};
use crate::metrics::Metrics;
use crate::output::{emit_success, HumanOutput};

use super::{describe_status, push_metrics, task_line, BoardOptions};

/// Options for the report command
pub struct ReportOptions {
    pub board: BoardOptions,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct ReportData {
    load: LoadStatus,
    total: usize,
    tasks: Vec<DerivedTask>,
    metrics: Metrics,
}

#[derive(Serialize)]
struct InsightsData {
    load: LoadStatus,
    #[serde(flatten)]
    insights: Insights,
}

pub fn run_report(options: ReportOptions) -> Result<()> {
    let board = options.board.bootstrap()?;
    let mut tasks = board.store.derived_sorted();
    let total = tasks.len();
    if let Some(limit) = options.limit {
        tasks.truncate(limit);
    }
    let metrics = board.store.metrics();

    let mut human = HumanOutput::new(format!(
        "salesboard report: {}",
        describe_status(&board.status)
    ));
    push_metrics(&mut human, &metrics);
    for derived in &tasks {
        human.push_row(task_line(derived));
    }
    if tasks.len() < total {
        human.push_row(format!("... {} more", total - tasks.len()));
    }
    push_fallback_warning(&mut human, &board.status);

    let data = ReportData {
        load: board.status,
        total,
        tasks,
        metrics,
    };
    emit_success(options.board.output(), "report", &data, Some(&human))
}

pub fn run_insights(options: BoardOptions) -> Result<()> {
    let board = options.bootstrap()?;
    let insights = Insights::compute(&board.store.derived_sorted());

    let mut human = insights_output(
        format!("salesboard insights: {}", describe_status(&board.status)),
        &insights,
    );
    push_fallback_warning(&mut human, &board.status);

    let data = InsightsData {
        load: board.status,
        insights,
    };
    emit_success(options.output(), "insights", &data, Some(&human))
}

pub(super) fn insights_output(header: String, insights: &Insights) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    for entry in &insights.revenue_by_priority {
        human.push_summary(
            format!("{} priority", entry.priority),
            format!("{:.2}", entry.revenue),
        );
    }
    for entry in &insights.revenue_by_status {
        human.push_summary(entry.status.as_str(), format!("{:.2}", entry.revenue));
    }
    for bucket in &insights.roi_distribution {
        human.push_row(format!("ROI {}: {}", bucket.label, bucket.count));
    }
    human
}

fn push_fallback_warning(human: &mut HumanOutput, status: &LoadStatus) {
    if let LoadStatus::Loaded {
        origin: LoadOrigin::Fallback,
        ..
    } = status
    {
        human.push_warning("task source unavailable, showing generated tasks");
        human.push_next_step("set loader.source in .salesboard.toml or pass --source");
    }
}
