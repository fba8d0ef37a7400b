//! Column projection and drag-and-drop transitions over a task list.
//!
//! These functions never touch the store. `BoardSession` pairs them with the
//! remote calls.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{Task, TaskStatus};
use crate::priority;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Columns {
    pub todo: Vec<Task>,
    pub scheduled: Vec<Task>,
    pub completed: Vec<Task>,
}

impl Columns {
    pub fn total(&self) -> usize {
        self.todo.len() + self.scheduled.len() + self.completed.len()
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::Scheduled => &self.scheduled,
            TaskStatus::Completed => &self.completed,
        }
    }
}

/// The write to send after a successful optimistic move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistRequest {
    pub id: String,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub next_tasks: Vec<Task>,
    /// `None` when the drag changes nothing.
    pub persist_request: Option<PersistRequest>,
}

/// Splits tasks by status. Only the todo column is re-ordered, by priority;
/// the others keep the input order. Due dates are counted from `now`'s
/// calendar date in its own time zone.
pub fn compute_columns<Tz: TimeZone>(tasks: &[Task], now: DateTime<Tz>) -> Columns {
    let mut columns = Columns::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => columns.todo.push(task.clone()),
            TaskStatus::Scheduled => columns.scheduled.push(task.clone()),
            TaskStatus::Completed => columns.completed.push(task.clone()),
        }
    }
    priority::sort_by_priority(&mut columns.todo, now.date_naive());
    columns
}

pub fn apply_drag_end(
    tasks: &[Task],
    dragged_id: &str,
    target: TaskStatus,
    now: DateTime<Utc>,
) -> DragOutcome {
    let unchanged = || DragOutcome {
        next_tasks: tasks.to_vec(),
        persist_request: None,
    };

    let Some(current) = tasks.iter().find(|t| t.id == dragged_id) else {
        return unchanged();
    };
    if current.status == target {
        return unchanged();
    }

    let completed_at = (target == TaskStatus::Completed).then_some(now);
    let next_tasks = tasks
        .iter()
        .map(|t| {
            if t.id == dragged_id {
                Task {
                    status: target,
                    completed_at,
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect();

    DragOutcome {
        next_tasks,
        persist_request: Some(PersistRequest {
            id: dragged_id.to_string(),
            status: target,
            completed_at,
        }),
    }
}

/// Local state to adopt once the store has confirmed a delete.
pub fn apply_delete_confirmed(tasks: &[Task], id: &str) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != id).cloned().collect()
}
