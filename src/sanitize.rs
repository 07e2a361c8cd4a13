//! Normalization of untrusted task records.
//!
//! This is the only place raw JSON turns into [`Task`] values. Nothing here
//! fails: a record that cannot be salvaged is dropped, and a field that
//! cannot be salvaged falls back to its default.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::task::{Priority, Status, Task};

/// Offset between a synthesized `createdAt` and its `completedAt`.
pub const SYNTHETIC_COMPLETION_OFFSET_HOURS: i64 = 24;

/// Normalize a batch of raw records.
///
/// Records missing a usable `id` or `title` are dropped. A missing
/// `createdAt` is synthesized from the record's index, one day apart, so the
/// first record is the oldest.
pub fn normalize(raw: &[Value], now: DateTime<Utc>) -> Vec<Task> {
    let len = raw.len() as i64;
    let tasks: Vec<Task> = raw
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            let fallback_created = now - Duration::days(len - idx as i64);
            normalize_record(record, fallback_created)
        })
        .collect();

    let dropped = raw.len() - tasks.len();
    if dropped > 0 {
        tracing::debug!(kept = tasks.len(), dropped, "normalize dropped invalid records");
    }
    tasks
}

/// Normalize one record; `None` if it has no usable `id` or `title`.
pub fn normalize_record(record: &Value, fallback_created: DateTime<Utc>) -> Option<Task> {
    let map = record.as_object()?;
    let id = sanitize_id(map.get("id"))?;
    let title = sanitize_title(map.get("title"))?;

    let status = sanitize_status(map.get("status"));
    let created_at = parse_timestamp(map.get("createdAt")).unwrap_or(fallback_created);
    let completed_at = parse_timestamp(map.get("completedAt")).or_else(|| {
        status
            .is_done()
            .then(|| created_at + Duration::hours(SYNTHETIC_COMPLETION_OFFSET_HOURS))
    });

    Some(Task {
        id,
        title,
        revenue: sanitize_revenue(map.get("revenue")),
        time_taken: sanitize_time_taken(map.get("timeTaken")),
        priority: sanitize_priority(map.get("priority")),
        status,
        notes: sanitize_notes(map.get("notes")),
        created_at,
        completed_at,
    })
}

/// Re-apply field rules to an already-typed task.
pub fn resanitize(task: Task) -> Task {
    Task {
        revenue: non_negative(task.revenue),
        time_taken: non_negative(task.time_taken),
        notes: task.notes.as_deref().and_then(trimmed),
        ..task
    }
}

pub fn sanitize_revenue(value: Option<&Value>) -> f64 {
    value.and_then(coerce_number).map(non_negative).unwrap_or(0.0)
}

pub fn sanitize_time_taken(value: Option<&Value>) -> f64 {
    sanitize_revenue(value)
}

pub fn sanitize_priority(value: Option<&Value>) -> Priority {
    value
        .and_then(Value::as_str)
        .and_then(Priority::parse)
        .unwrap_or_default()
}

pub fn sanitize_status(value: Option<&Value>) -> Status {
    value
        .and_then(Value::as_str)
        .and_then(Status::parse)
        .unwrap_or_default()
}

pub fn sanitize_notes(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).and_then(trimmed)
}

pub fn sanitize_id(value: Option<&Value>) -> Option<String> {
    non_blank(value)
}

/// Trimmed title, or `None` when the value is not a non-blank string.
pub fn sanitize_title(value: Option<&Value>) -> Option<String> {
    non_blank(value)
}

/// Loose numeric coercion: numbers pass, strings are parsed (blank is 0),
/// booleans are 0/1, null is 0. Arrays and objects fail.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Some(0.0)
            } else {
                text.parse::<f64>().ok()
            }
        }
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).and_then(trimmed)
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn drops_records_without_id_or_title() {
        let raw = vec![
            json!("not an object"),
            json!(null),
            json!({ "id": "", "title": "x" }),
            json!({ "id": "a", "title": "   " }),
            json!({ "id": 7, "title": "numeric id" }),
            json!({ "title": "no id" }),
            json!({ "id": " b ", "title": " Keep me " }),
        ];
        let tasks = normalize(&raw, now());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "b");
        assert_eq!(tasks[0].title, "Keep me");
    }

    #[test]
    fn numeric_fields_default_to_zero() {
        let cases = [
            (json!(-5), 0.0),
            (json!("abc"), 0.0),
            (json!([1]), 0.0),
            (json!(null), 0.0),
            (json!(""), 0.0),
            (json!(" 12.5 "), 12.5),
            (json!(true), 1.0),
            (json!(1e308), 1e308),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_revenue(Some(&input)), expected, "input {input}");
            assert_eq!(sanitize_time_taken(Some(&input)), expected, "input {input}");
        }
        assert_eq!(sanitize_revenue(None), 0.0);
        assert_eq!(sanitize_revenue(Some(&json!("inf"))), 0.0);
        assert_eq!(sanitize_revenue(Some(&json!("NaN"))), 0.0);
    }

    #[test]
    fn enums_fall_back_to_defaults() {
        assert_eq!(sanitize_priority(Some(&json!("Urgent"))), Priority::Medium);
        assert_eq!(sanitize_priority(Some(&json!("Low"))), Priority::Low);
        assert_eq!(sanitize_status(Some(&json!("done"))), Status::Todo);
        assert_eq!(sanitize_status(Some(&json!("In Progress"))), Status::InProgress);
        assert_eq!(sanitize_status(Some(&json!(3))), Status::Todo);
    }

    #[test]
    fn notes_are_trimmed_or_omitted() {
        assert_eq!(sanitize_notes(Some(&json!("  hi  "))), Some("hi".to_string()));
        assert_eq!(sanitize_notes(Some(&json!("   "))), None);
        assert_eq!(sanitize_notes(Some(&json!(42))), None);
        assert_eq!(sanitize_notes(None), None);
    }

    #[test]
    fn created_at_is_synthesized_per_index() {
        let raw = vec![
            json!({ "id": "a", "title": "first" }),
            json!({ "id": "b", "title": "second" }),
            json!({ "id": "c", "title": "third", "createdAt": "not a date" }),
        ];
        let tasks = normalize(&raw, now());
        assert_eq!(tasks[0].created_at, now() - Duration::days(3));
        assert_eq!(tasks[1].created_at, now() - Duration::days(2));
        assert_eq!(tasks[2].created_at, now() - Duration::days(1));
        assert!(tasks[0].created_at < tasks[1].created_at);
    }

    #[test]
    fn completed_at_synthesized_only_for_done() {
        let raw = vec![
            json!({ "id": "a", "title": "t", "status": "Done", "createdAt": "2024-01-01T00:00:00Z" }),
            json!({ "id": "b", "title": "t", "status": "Todo", "createdAt": "2024-01-01T00:00:00Z" }),
            json!({
                "id": "c",
                "title": "t",
                "status": "Todo",
                "completedAt": "2024-01-05T00:00:00Z"
            }),
        ];
        let tasks = normalize(&raw, now());
        assert_eq!(
            tasks[0].completed_at,
            Some("2024-01-02T00:00:00Z".parse().unwrap())
        );
        assert_eq!(tasks[1].completed_at, None);
        assert_eq!(
            tasks[2].completed_at,
            Some("2024-01-05T00:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = vec![
            json!({
                "id": "x",
                "title": "  Renewal ",
                "revenue": "1200",
                "timeTaken": -3,
                "priority": "High",
                "status": "Done",
                "notes": "  call back "
            }),
            json!({ "id": "y", "title": "Cold call", "revenue": null, "priority": "??" }),
            json!(12),
        ];
        let once = normalize(&raw, now());
        let values: Vec<Value> = once.iter().map(Task::to_value).collect();
        let later = now() + Duration::days(30);
        let twice = normalize(&values, later);
        assert_eq!(once, twice);
    }

    #[test]
    fn resanitize_clamps_typed_fields() {
        let task = Task {
            id: "a".to_string(),
            title: "t".to_string(),
            revenue: -1.0,
            time_taken: f64::INFINITY,
            priority: Priority::Low,
            status: Status::Todo,
            notes: Some("  ".to_string()),
            created_at: now(),
            completed_at: None,
        };
        let task = resanitize(task);
        assert_eq!(task.revenue, 0.0);
        assert_eq!(task.time_taken, 0.0);
        assert_eq!(task.notes, None);
    }
}
