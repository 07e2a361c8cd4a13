//! Derived task views and display ordering.

use std::cmp::Ordering;

use serde::Serialize;

use crate::metrics::calculate_roi;
use crate::task::Task;

/// A task plus its computed fields. Built fresh on every read.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DerivedTask {
    #[serde(flatten)]
    pub task: Task,
    /// `None` when ROI is not meaningful (no time logged).
    pub roi: Option<f64>,
}

pub fn with_derived(task: &Task) -> DerivedTask {
    DerivedTask {
        task: task.clone(),
        roi: calculate_roi(task.revenue, task.time_taken),
    }
}

/// Display order: ROI descending with undefined ROI last, then priority
/// High to Low, then title (case-insensitive). The sort is stable, so
/// remaining ties keep their input order.
pub fn sort_tasks(mut tasks: Vec<DerivedTask>) -> Vec<DerivedTask> {
    tasks.sort_by(|left, right| {
        roi_rank(left.roi, right.roi)
            .then_with(|| left.task.priority.rank().cmp(&right.task.priority.rank()))
            .then_with(|| {
                left.task
                    .title
                    .to_lowercase()
                    .cmp(&right.task.title.to_lowercase())
            })
    });
    tasks
}

pub fn derive_sorted(tasks: &[Task]) -> Vec<DerivedTask> {
    sort_tasks(tasks.iter().map(with_derived).collect())
}

fn roi_rank(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => right.total_cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
