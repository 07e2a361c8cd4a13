//! Per-task ROI and aggregate metrics.
//!
//! Everything here is a pure function of a task slice. Aggregates are always
//! recomputed from scratch; nothing is cached between reads.

use std::fmt;

use serde::Serialize;

use crate::task::Task;

/// Average ROI above which a portfolio is graded excellent.
pub const EXCELLENT_ROI_THRESHOLD: f64 = 500.0;
/// Average ROI at or above which a portfolio is graded good.
pub const GOOD_ROI_THRESHOLD: f64 = 200.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerformanceGrade {
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Good,
    Excellent,
}

impl PerformanceGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceGrade::NeedsImprovement => "Needs Improvement",
            PerformanceGrade::Good => "Good",
            PerformanceGrade::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate snapshot over a task collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_revenue: f64,
    pub total_time_taken: f64,
    pub time_efficiency_pct: f64,
    pub revenue_per_hour: f64,
    #[serde(rename = "averageROI")]
    pub average_roi: f64,
    pub performance_grade: PerformanceGrade,
}

impl Metrics {
    /// Snapshot reported for an empty collection.
    pub fn zeroed() -> Self {
        Self {
            total_revenue: 0.0,
            total_time_taken: 0.0,
            time_efficiency_pct: 0.0,
            revenue_per_hour: 0.0,
            average_roi: 0.0,
            performance_grade: PerformanceGrade::NeedsImprovement,
        }
    }

    pub fn compute(tasks: &[Task]) -> Self {
        if tasks.is_empty() {
            return Self::zeroed();
        }
        let average_roi = compute_average_roi(tasks);
        Self {
            total_revenue: compute_total_revenue(tasks),
            total_time_taken: compute_total_time(tasks),
            time_efficiency_pct: compute_time_efficiency(tasks),
            revenue_per_hour: compute_revenue_per_hour(tasks),
            average_roi,
            performance_grade: compute_performance_grade(average_roi),
        }
    }
}

/// Revenue per hour for one task; `None` when time is not positive or the
/// ratio is not finite.
pub fn calculate_roi(revenue: f64, time_taken: f64) -> Option<f64> {
    if !time_taken.is_finite() || time_taken <= 0.0 {
        return None;
    }
    let roi = revenue / time_taken;
    roi.is_finite().then_some(roi)
}

/// Totals saturate at `f64::MAX` instead of overflowing to infinity.
pub fn compute_total_revenue(tasks: &[Task]) -> f64 {
    saturating_sum(tasks.iter().map(|task| task.revenue))
}

pub fn compute_total_time(tasks: &[Task]) -> f64 {
    saturating_sum(tasks.iter().map(|task| task.time_taken))
}

/// Share of total hours spent on Done tasks, as a percentage.
///
/// Hours are scaled by the largest entry first so huge values cannot
/// overflow the ratio.
pub fn compute_time_efficiency(tasks: &[Task]) -> f64 {
    let scale = tasks
        .iter()
        .map(|task| task.time_taken)
        .fold(0.0_f64, f64::max);
    if !scale.is_finite() || scale <= 0.0 {
        return 0.0;
    }
    let total: f64 = tasks.iter().map(|task| task.time_taken / scale).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let done: f64 = tasks
        .iter()
        .filter(|task| task.status.is_done())
        .map(|task| task.time_taken / scale)
        .sum();
    finite_or_zero(done / total * 100.0).clamp(0.0, 100.0)
}

pub fn compute_revenue_per_hour(tasks: &[Task]) -> f64 {
    let total = compute_total_time(tasks);
    if total <= 0.0 {
        return 0.0;
    }
    finite_or_zero(compute_total_revenue(tasks) / total)
}

/// Mean ROI over tasks whose ROI is defined. Tasks with no time logged are
/// skipped rather than counted as zero.
pub fn compute_average_roi(tasks: &[Task]) -> f64 {
    let (sum, count) = tasks
        .iter()
        .filter_map(|task| calculate_roi(task.revenue, task.time_taken))
        .fold((0.0, 0usize), |(sum, count), roi| (sum + roi, count + 1));
    if count == 0 {
        return 0.0;
    }
    finite_or_zero(sum / count as f64)
}

pub fn compute_performance_grade(average_roi: f64) -> PerformanceGrade {
    if average_roi > EXCELLENT_ROI_THRESHOLD {
        PerformanceGrade::Excellent
    } else if average_roi >= GOOD_ROI_THRESHOLD {
        PerformanceGrade::Good
    } else {
        PerformanceGrade::NeedsImprovement
    }
}

fn saturating_sum(values: impl Iterator<Item = f64>) -> f64 {
    let sum: f64 = values.sum();
    if sum.is_nan() {
        0.0
    } else {
        sum.clamp(-f64::MAX, f64::MAX)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, Status};

    fn task(id: &str, revenue: f64, time_taken: f64, status: Status) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            revenue,
            time_taken,
            priority: Priority::Medium,
            status,
            notes: None,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn roi_is_revenue_per_hour() {
        assert_eq!(calculate_roi(1000.0, 10.0), Some(100.0));
        assert_eq!(calculate_roi(100.0, 10.0), Some(10.0));
        assert_eq!(calculate_roi(0.0, 4.0), Some(0.0));
    }

    #[test]
    fn roi_undefined_for_non_positive_time() {
        assert_eq!(calculate_roi(1000.0, 0.0), None);
        assert_eq!(calculate_roi(1000.0, -1.0), None);
        assert_eq!(calculate_roi(1000.0, f64::NAN), None);
        assert_eq!(calculate_roi(f64::MAX, f64::MIN_POSITIVE), None);
    }

    #[test]
    fn empty_collection_is_zeroed() {
        assert_eq!(Metrics::compute(&[]), Metrics::zeroed());
        assert_eq!(compute_average_roi(&[]), 0.0);
        assert_eq!(compute_time_efficiency(&[]), 0.0);
        assert_eq!(compute_revenue_per_hour(&[]), 0.0);
        assert_eq!(compute_total_revenue(&[]), 0.0);
    }

    #[test]
    fn zero_time_is_well_defined() {
        let tasks = vec![task("a", 500.0, 0.0, Status::Done)];
        let metrics = Metrics::compute(&tasks);
        assert_eq!(metrics.total_revenue, 500.0);
        assert_eq!(metrics.time_efficiency_pct, 0.0);
        assert_eq!(metrics.revenue_per_hour, 0.0);
        assert_eq!(metrics.average_roi, 0.0);
    }

    #[test]
    fn average_roi_excludes_undefined() {
        let tasks = vec![
            task("a", 1000.0, 10.0, Status::Todo),
            task("b", 300.0, 1.0, Status::Todo),
            task("c", 9999.0, 0.0, Status::Todo),
        ];
        assert_eq!(compute_average_roi(&tasks), 200.0);
    }

    #[test]
    fn time_efficiency_counts_done_hours() {
        let tasks = vec![
            task("a", 0.0, 3.0, Status::Done),
            task("b", 0.0, 1.0, Status::InProgress),
        ];
        assert_eq!(compute_time_efficiency(&tasks), 75.0);
    }

    #[test]
    fn huge_hours_keep_metrics_finite() {
        let tasks = vec![
            task("a", 1e308, 1e308, Status::Done),
            task("b", 1e308, 1e308, Status::Done),
            task("c", 1e308, 1e308, Status::Todo),
            task("d", 1e308, 1e308, Status::Todo),
        ];
        let metrics = Metrics::compute(&tasks);
        assert_eq!(metrics.total_revenue, f64::MAX);
        assert_eq!(metrics.total_time_taken, f64::MAX);
        assert_eq!(metrics.time_efficiency_pct, 50.0);
        assert_eq!(metrics.revenue_per_hour, 1.0);

        let value = serde_json::to_value(&metrics).unwrap();
        for key in ["totalRevenue", "totalTimeTaken", "timeEfficiencyPct", "revenuePerHour"] {
            assert!(value[key].is_number(), "{key} serialized as {}", value[key]);
        }
    }

    #[test]
    fn revenue_per_hour_uses_totals() {
        let tasks = vec![
            task("a", 100.0, 1.0, Status::Done),
            task("b", 300.0, 3.0, Status::Todo),
        ];
        assert_eq!(compute_revenue_per_hour(&tasks), 100.0);
    }

    #[test]
    fn grade_is_total() {
        assert_eq!(compute_performance_grade(-10.0), PerformanceGrade::NeedsImprovement);
        assert_eq!(compute_performance_grade(0.0), PerformanceGrade::NeedsImprovement);
        assert_eq!(compute_performance_grade(f64::NAN), PerformanceGrade::NeedsImprovement);
        assert_eq!(compute_performance_grade(200.0), PerformanceGrade::Good);
        assert_eq!(compute_performance_grade(500.0), PerformanceGrade::Good);
        assert_eq!(compute_performance_grade(500.5), PerformanceGrade::Excellent);
        assert_eq!(compute_performance_grade(f64::INFINITY), PerformanceGrade::Excellent);
    }

    #[test]
    fn metrics_serialize_with_wire_names() {
        let value = serde_json::to_value(Metrics::zeroed()).unwrap();
        assert_eq!(value["averageROI"], serde_json::json!(0.0));
        assert_eq!(value["performanceGrade"], serde_json::json!("Needs Improvement"));
        assert!(value.get("timeEfficiencyPct").is_some());
    }
}
