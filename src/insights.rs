//! Breakdowns for dashboards: revenue by priority and status, ROI
//! distribution, display formatting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::derive::DerivedTask;
use crate::task::{Priority, Status};

/// ROI below this lands in the lowest bucket.
pub const ROI_BUCKET_LOW: f64 = 200.0;
/// ROI above this lands in the highest bucket.
pub const ROI_BUCKET_HIGH: f64 = 500.0;

const UNDEFINED_ROI_DISPLAY: &str = "—";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriorityRevenue {
    pub priority: Priority,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusRevenue {
    pub status: Status,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoiBucket {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Insights {
    pub revenue_by_priority: Vec<PriorityRevenue>,
    pub revenue_by_status: Vec<StatusRevenue>,
    pub roi_distribution: Vec<RoiBucket>,
}

impl Insights {
    pub fn compute(tasks: &[DerivedTask]) -> Self {
        Self {
            revenue_by_priority: revenue_by_priority(tasks),
            revenue_by_status: revenue_by_status(tasks),
            roi_distribution: roi_distribution(tasks),
        }
    }
}

pub fn revenue_by_priority(tasks: &[DerivedTask]) -> Vec<PriorityRevenue> {
    Priority::ALL
        .into_iter()
        .map(|priority| PriorityRevenue {
            priority,
            revenue: tasks
                .iter()
                .filter(|derived| derived.task.priority == priority)
                .map(|derived| derived.task.revenue)
                .sum(),
        })
        .collect()
}

pub fn revenue_by_status(tasks: &[DerivedTask]) -> Vec<StatusRevenue> {
    Status::ALL
        .into_iter()
        .map(|status| StatusRevenue {
            status,
            revenue: tasks
                .iter()
                .filter(|derived| derived.task.status == status)
                .map(|derived| derived.task.revenue)
                .sum(),
        })
        .collect()
}

/// Bucket counts in display order: `<200`, `200-500`, `>500`, `N/A`.
pub fn roi_distribution(tasks: &[DerivedTask]) -> Vec<RoiBucket> {
    let mut counts = [0usize; 4];
    for derived in tasks {
        let slot = match displayable_roi(derived.roi) {
            None => 3,
            Some(roi) if roi < ROI_BUCKET_LOW => 0,
            Some(roi) if roi <= ROI_BUCKET_HIGH => 1,
            Some(_) => 2,
        };
        counts[slot] += 1;
    }
    ["<200", "200-500", ">500", "N/A"]
        .into_iter()
        .zip(counts)
        .map(|(label, count)| RoiBucket { label, count })
        .collect()
}

/// Two decimals, or a dash when ROI is undefined or indistinguishable from
/// zero.
pub fn format_roi(roi: Option<f64>) -> String {
    match displayable_roi(roi) {
        Some(roi) => format!("{roi:.2}"),
        None => UNDEFINED_ROI_DISPLAY.to_string(),
    }
}

/// Whole days from creation to completion, never negative.
pub fn cycle_days(created_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> i64 {
    (completed_at - created_at).num_days().max(0)
}

fn displayable_roi(roi: Option<f64>) -> Option<f64> {
    roi.filter(|value| value.is_finite() && value.abs() >= f64::EPSILON)
}
