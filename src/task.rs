//! Task model.
//!
//! Tasks serialize with the same camelCase field names that raw bootstrap
//! records use, so a serialized task can be fed back through
//! [`crate::sanitize::normalize`] unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_TITLE: &str = "Untitled task";

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Exact wire-name match.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.as_str() == value)
    }

    /// Display rank, High first.
    pub fn rank(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "Todo",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn is_done(self) -> bool {
        self == Status::Done
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated task. Only the sanitizer and the store construct these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub revenue: f64,
    pub time_taken: f64,
    pub priority: Priority,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Raw-record form of this task, as accepted by the sanitizer.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Loosely typed task fields coming from a collaborator.
///
/// Every field is untrusted; the store sanitizes whatever is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub revenue: Option<Value>,
    pub time_taken: Option<Value>,
    pub priority: Option<Value>,
    pub status: Option<Value>,
    pub notes: Option<Value>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(Value::String(title.into())),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(Value::String(id.into()));
        self
    }

    pub fn revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(number(revenue));
        self
    }

    pub fn time_taken(mut self, hours: f64) -> Self {
        self.time_taken = Some(number(hours));
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(Value::String(priority.as_str().to_string()));
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(Value::String(status.as_str().to_string()));
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(Value::String(notes.into()));
        self
    }

    /// Pick the known fields out of a JSON object; anything else yields an
    /// empty input.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self {
            id: map.get("id").cloned(),
            title: map.get("title").cloned(),
            revenue: map.get("revenue").cloned(),
            time_taken: map.get("timeTaken").cloned(),
            priority: map.get("priority").cloned(),
            status: map.get("status").cloned(),
            notes: map.get("notes").cloned(),
        }
    }
}

/// Partial update. Absent fields keep their current value.
///
/// `id`, `createdAt` and `completedAt` are deliberately not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<Value>,
    pub revenue: Option<Value>,
    pub time_taken: Option<Value>,
    pub priority: Option<Value>,
    pub status: Option<Value>,
    pub notes: Option<Value>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Value::String(title.into()));
        self
    }

    pub fn revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(number(revenue));
        self
    }

    pub fn time_taken(mut self, hours: f64) -> Self {
        self.time_taken = Some(number(hours));
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(Value::String(priority.as_str().to_string()));
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(Value::String(status.as_str().to_string()));
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(Value::String(notes.into()));
        self
    }

    pub fn clear_notes(mut self) -> Self {
        self.notes = Some(Value::Null);
        self
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            title: map.get("title").cloned(),
            revenue: map.get("revenue").cloned(),
            time_taken: map.get("timeTaken").cloned(),
            priority: map.get("priority").cloned(),
            status: map.get("status").cloned(),
            notes: map.get("notes").cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// Non-finite floats have no JSON form; they become null, which the
// sanitizer coerces to 0 like any other invalid number.
fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
