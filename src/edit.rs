//! Editing guard for the task details surface.
//!
//! The store itself accepts anything and coerces it. Edits made through the
//! details surface are stricter: revenue and time taken must both be
//! strictly positive, and a rejected edit leaves the store untouched.

use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::task::{Task, TaskPatch};

/// Values submitted from the details surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdit {
    pub revenue: f64,
    pub time_taken: f64,
    pub notes: Option<String>,
}

pub fn validate_edit(edit: &TaskEdit) -> Result<()> {
    if !(edit.revenue.is_finite() && edit.revenue > 0.0) {
        return Err(Error::EditRejected(
            "Revenue must be greater than 0".to_string(),
        ));
    }
    if !(edit.time_taken.is_finite() && edit.time_taken > 0.0) {
        return Err(Error::EditRejected(
            "Time taken must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Validate and apply an edit to the first task with `id`.
///
/// Blank notes clear the task's notes.
pub fn apply_edit<'a>(store: &'a mut TaskStore, id: &str, edit: TaskEdit) -> Result<&'a Task> {
    validate_edit(&edit)?;
    if store.find(id).is_none() {
        return Err(Error::TaskNotFound(id.to_string()));
    }

    let patch = TaskPatch::new()
        .revenue(edit.revenue)
        .time_taken(edit.time_taken);
    let patch = match edit.notes {
        Some(notes) => patch.notes(notes),
        None => patch.clear_notes(),
    };
    store
        .update_task(id, patch)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}
