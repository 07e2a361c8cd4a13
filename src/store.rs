//! In-memory task store with single-slot undo.
//!
//! The store owns the canonical collection. Mutations go through a narrow
//! API and every read view (derived tasks, metrics) is recomputed from the
//! current collection, so callers never see stale values.
//!
//! Undo state machine:
//!
//! ```text
//! Idle --delete--> PendingUndo --(undo | dismiss | timeout)--> Idle
//! ```
//!
//! Only one deletion is pending at a time; a second delete replaces it.
//! Ids are not required to be unique. Every id-keyed operation acts on the
//! first matching task.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::derive::{derive_sorted, DerivedTask};
use crate::metrics::Metrics;
use crate::sanitize::{
    resanitize, sanitize_id, sanitize_notes, sanitize_priority, sanitize_revenue,
    sanitize_status, sanitize_time_taken, sanitize_title,
};
use crate::task::{Task, TaskInput, TaskPatch, DEFAULT_TITLE};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UndoState {
    Idle,
    PendingUndo,
}

/// The most recently deleted task, held until undone or dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUndo {
    pub task: Task,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    pending: Option<PendingUndo>,
    undo_visible: bool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("pending", &self.pending)
            .field("undo_visible", &self.undo_visible)
            .finish_non_exhaustive()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Vec::new(),
            pending: None,
            undo_visible: false,
            clock,
        }
    }

    /// Seed the store with an already-sanitized collection.
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// First task with a matching id.
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn derived_sorted(&self) -> Vec<DerivedTask> {
        derive_sorted(&self.tasks)
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::compute(&self.tasks)
    }

    pub fn last_deleted(&self) -> Option<&Task> {
        self.pending.as_ref().map(|pending| &pending.task)
    }

    pub fn undo_visible(&self) -> bool {
        self.undo_visible
    }

    pub fn undo_state(&self) -> UndoState {
        if self.pending.is_some() {
            UndoState::PendingUndo
        } else {
            UndoState::Idle
        }
    }

    /// Create a task from loose input. Never fails: a missing id gets a
    /// fresh UUID, a blank title becomes [`DEFAULT_TITLE`] and every other
    /// field is coerced by the sanitizer.
    pub fn add_task(&mut self, input: TaskInput) -> &Task {
        let now = self.clock.now();
        let id = sanitize_id(input.id.as_ref()).unwrap_or_else(|| Uuid::new_v4().to_string());
        let title =
            sanitize_title(input.title.as_ref()).unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let status = sanitize_status(input.status.as_ref());

        let task = Task {
            id,
            title,
            revenue: sanitize_revenue(input.revenue.as_ref()),
            time_taken: sanitize_time_taken(input.time_taken.as_ref()),
            priority: sanitize_priority(input.priority.as_ref()),
            status,
            notes: sanitize_notes(input.notes.as_ref()),
            created_at: now,
            completed_at: status.is_done().then_some(now),
        };
        tracing::debug!(
            id = %task.id,
            revenue = task.revenue,
            time_taken = task.time_taken,
            "add task"
        );

        let idx = self.tasks.len();
        self.tasks.push(task);
        &self.tasks[idx]
    }

    /// Merge a patch over the first task with `id`. Returns `None` and
    /// changes nothing when the id is unknown.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Option<&Task> {
        let now = self.clock.now();
        let Some(idx) = self.position(id) else {
            tracing::debug!(id, "update skipped: task not found");
            return None;
        };

        let task = &mut self.tasks[idx];
        if let Some(title) = sanitize_title(patch.title.as_ref()) {
            task.title = title;
        }
        if let Some(revenue) = patch.revenue.as_ref() {
            task.revenue = sanitize_revenue(Some(revenue));
        }
        if let Some(time_taken) = patch.time_taken.as_ref() {
            task.time_taken = sanitize_time_taken(Some(time_taken));
        }
        if let Some(priority) = patch.priority.as_ref() {
            task.priority = sanitize_priority(Some(priority));
        }
        if let Some(status) = patch.status.as_ref() {
            task.status = sanitize_status(Some(status));
        }
        // A null or blank notes value clears the notes.
        if let Some(notes) = patch.notes.as_ref() {
            task.notes = sanitize_notes(Some(notes));
        }
        // Set once: a later move away from Done keeps the timestamp.
        if task.status.is_done() && task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
        tracing::debug!(
            id,
            revenue = task.revenue,
            time_taken = task.time_taken,
            status = %task.status,
            "update task"
        );

        Some(&self.tasks[idx])
    }

    /// Remove the first task with `id` and hold it for undo. An unknown id
    /// leaves the collection alone and drops any pending undo.
    pub fn delete_task(&mut self, id: &str) -> Option<Task> {
        let Some(idx) = self.position(id) else {
            tracing::debug!(id, "delete skipped: task not found");
            self.clear_pending();
            return None;
        };

        let task = self.tasks.remove(idx);
        if let Some(previous) = self.pending.as_ref() {
            tracing::debug!(id = %previous.task.id, "pending undo replaced");
        }
        self.pending = Some(PendingUndo {
            task: task.clone(),
            deleted_at: self.clock.now(),
        });
        self.undo_visible = true;
        tracing::debug!(id, title = %task.title, "delete task");
        Some(task)
    }

    /// Restore the pending deletion at the end of the collection.
    pub fn undo_delete(&mut self) -> Option<&Task> {
        let Some(pending) = self.pending.take() else {
            tracing::debug!("undo skipped: nothing to restore");
            self.undo_visible = false;
            return None;
        };
        self.undo_visible = false;

        let restored = resanitize(pending.task);
        tracing::debug!(id = %restored.id, title = %restored.title, "undo delete");
        let idx = self.tasks.len();
        self.tasks.push(restored);
        Some(&self.tasks[idx])
    }

    pub fn dismiss_undo(&mut self) {
        tracing::debug!("dismiss undo");
        self.clear_pending();
    }

    /// Dismiss the pending deletion once it is at least `timeout` old.
    /// Returns true when something expired.
    pub fn expire_undo(&mut self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let expired = self
            .pending
            .as_ref()
            .is_some_and(|pending| now - pending.deleted_at >= timeout);
        if expired {
            tracing::debug!("pending undo expired");
            self.clear_pending();
        }
        expired
    }

    /// [`Self::expire_undo`] measured against the store's clock.
    pub fn expire_stale_undo(&mut self, timeout: Duration) -> bool {
        let now = self.clock.now();
        self.expire_undo(now, timeout)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn clear_pending(&mut self) {
        self.pending = None;
        self.undo_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::task::{Priority, Status};
    use serde_json::json;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    fn store_at(ts: &str) -> TaskStore {
        TaskStore::with_clock(Arc::new(FixedClock(at(ts))))
    }

    #[test]
    fn add_assigns_id_and_defaults() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        let task = store.add_task(TaskInput {
            title: Some(json!("   ")),
            revenue: Some(json!(-10)),
            time_taken: Some(json!("3.5")),
            priority: Some(json!("Critical")),
            status: Some(json!("Done")),
            notes: Some(json!("  ")),
            ..TaskInput::default()
        });
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(task.title, DEFAULT_TITLE);
        assert_eq!(task.revenue, 0.0);
        assert_eq!(task.time_taken, 3.5);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.notes, None);
        assert_eq!(task.created_at, at("2024-03-01T09:00:00Z"));
        assert_eq!(task.completed_at, Some(at("2024-03-01T09:00:00Z")));
    }

    #[test]
    fn add_keeps_supplied_id() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        let task = store.add_task(TaskInput::new("Demo").id(" deal-1 ").revenue(10.0));
        assert_eq!(task.id, "deal-1");
        assert_eq!(task.completed_at, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        let before = store.tasks().to_vec();
        assert!(store.update_task("missing", TaskPatch::new().revenue(5.0)).is_none());
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn update_resanitizes_malformed_patch() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a").revenue(100.0).notes("keep"));
        let patch = TaskPatch {
            title: Some(json!("")),
            revenue: Some(json!("lots")),
            time_taken: Some(json!(-1)),
            priority: Some(json!(1)),
            status: Some(json!("Finished")),
            notes: None,
        };
        let task = store.update_task("a", patch).unwrap();
        assert_eq!(task.title, "A");
        assert_eq!(task.revenue, 0.0);
        assert_eq!(task.time_taken, 0.0);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.notes.as_deref(), Some("keep"));
    }

    #[test]
    fn update_can_clear_notes() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a").notes("old"));
        let task = store.update_task("a", TaskPatch::new().clear_notes()).unwrap();
        assert_eq!(task.notes, None);
    }

    #[test]
    fn completed_at_is_set_once() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));

        store.clock = Arc::new(FixedClock(at("2024-03-02T09:00:00Z")));
        let done = store
            .update_task("a", TaskPatch::new().status(Status::Done))
            .unwrap()
            .completed_at;
        assert_eq!(done, Some(at("2024-03-02T09:00:00Z")));

        store.clock = Arc::new(FixedClock(at("2024-03-03T09:00:00Z")));
        let reopened = store
            .update_task("a", TaskPatch::new().status(Status::Todo))
            .unwrap();
        assert_eq!(reopened.status, Status::Todo);
        assert_eq!(reopened.completed_at, done);

        let redone = store
            .update_task("a", TaskPatch::new().status(Status::Done))
            .unwrap();
        assert_eq!(redone.completed_at, done);
    }

    #[test]
    fn duplicate_ids_first_match_wins() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("First").id("dup"));
        store.add_task(TaskInput::new("Second").id("dup"));

        store.update_task("dup", TaskPatch::new().revenue(42.0));
        assert_eq!(store.tasks()[0].revenue, 42.0);
        assert_eq!(store.tasks()[1].revenue, 0.0);
        assert_eq!(store.find("dup").unwrap().title, "First");

        let deleted = store.delete_task("dup").unwrap();
        assert_eq!(deleted.title, "First");
        assert_eq!(store.find("dup").unwrap().title, "Second");
    }

    #[test]
    fn delete_then_undo_restores_task() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a").revenue(100.0).time_taken(10.0));
        store.add_task(TaskInput::new("B").id("b"));
        let original = store.find("a").cloned().unwrap();

        store.delete_task("a");
        assert_eq!(store.undo_state(), UndoState::PendingUndo);
        assert!(store.undo_visible());
        assert_eq!(store.last_deleted(), Some(&original));
        assert_eq!(store.len(), 1);

        let restored = store.undo_delete().cloned().unwrap();
        assert_eq!(restored, original);
        assert_eq!(store.len(), 2);
        assert!(!store.undo_visible());
        assert_eq!(store.undo_state(), UndoState::Idle);
        assert_eq!(store.tasks().iter().filter(|task| task.id == "a").count(), 1);
    }

    #[test]
    fn delete_unknown_clears_pending() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        store.add_task(TaskInput::new("B").id("b"));
        store.delete_task("a");

        assert!(store.delete_task("nope").is_none());
        assert_eq!(store.len(), 1);
        assert!(store.last_deleted().is_none());
        assert!(!store.undo_visible());
        assert!(store.undo_delete().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn second_delete_overwrites_pending() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        store.add_task(TaskInput::new("B").id("b"));
        store.delete_task("a");
        store.delete_task("b");

        assert_eq!(store.last_deleted().map(|task| task.id.as_str()), Some("b"));
        store.undo_delete();
        assert_eq!(store.len(), 1);
        assert!(store.find("a").is_none());
    }

    #[test]
    fn undo_with_nothing_pending_hides_prompt() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        assert!(store.undo_delete().is_none());
        assert!(!store.undo_visible());
    }

    #[test]
    fn dismiss_drops_pending() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        store.delete_task("a");
        store.dismiss_undo();
        assert_eq!(store.undo_state(), UndoState::Idle);
        assert!(store.undo_delete().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn expire_undo_respects_timeout() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        store.delete_task("a");

        let timeout = Duration::milliseconds(4000);
        assert!(!store.expire_undo(at("2024-03-01T09:00:03Z"), timeout));
        assert!(store.undo_visible());
        assert!(store.expire_undo(at("2024-03-01T09:00:04Z"), timeout));
        assert_eq!(store.undo_state(), UndoState::Idle);
        assert!(!store.expire_undo(at("2024-03-01T09:00:09Z"), timeout));
    }

    #[test]
    fn stale_undo_expires_on_store_clock() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        store.add_task(TaskInput::new("A").id("a"));
        store.delete_task("a");

        let timeout = Duration::milliseconds(4000);
        store.clock = Arc::new(FixedClock(at("2024-03-01T09:00:02Z")));
        assert!(!store.expire_stale_undo(timeout));
        assert!(store.undo_visible());

        store.clock = Arc::new(FixedClock(at("2024-03-01T09:00:04Z")));
        assert!(store.expire_stale_undo(timeout));
        assert_eq!(store.undo_state(), UndoState::Idle);
        assert!(store.undo_delete().is_none());
    }

    #[test]
    fn views_track_mutations() {
        let mut store = store_at("2024-03-01T09:00:00Z");
        assert_eq!(store.metrics(), Metrics::zeroed());
        store.add_task(TaskInput::new("A").id("a").revenue(100.0).time_taken(10.0));
        assert_eq!(store.metrics().average_roi, 10.0);
        store.update_task("a", TaskPatch::new().revenue(300.0));
        assert_eq!(store.metrics().average_roi, 30.0);
        assert_eq!(store.derived_sorted()[0].roi, Some(30.0));
        store.delete_task("a");
        assert_eq!(store.metrics(), Metrics::zeroed());
    }
}
