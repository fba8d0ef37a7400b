use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board::{self, Columns};
use crate::error::AppError;
use crate::models::{NewTaskRequest, Quadrant, Task, TaskStatus};
use crate::priority;
use crate::store::TaskStore;

pub const DELETED_NOTICE: &str = "Task deleted.";

/// One user's view of the board: a cache of the store's task list plus the
/// latest notices. The lock is only held between remote calls.
pub struct BoardSession {
    store: Arc<dyn TaskStore>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    tasks: Vec<Task>,
    error: Option<String>,
    info: Option<String>,
    /// Ids with a status update or delete awaiting the store.
    in_flight: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Unknown id or same column; nothing was sent.
    Unchanged,
    Persisted,
    /// The store rejected the update and the board was rebuilt from a fetch.
    Reconciled { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub columns: Columns,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// A not-yet-completed task as plotted on the importance/urgency graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixPoint {
    pub id: String,
    pub title: String,
    pub importance: i32,
    pub urgency: i32,
    pub quadrant: Quadrant,
    pub score: f64,
}

impl BoardSession {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn info(&self) -> Option<String> {
        self.lock().info.clone()
    }

    pub fn view<Tz: TimeZone>(&self, now: DateTime<Tz>) -> BoardView {
        let state = self.lock();
        BoardView {
            columns: board::compute_columns(&state.tasks, now),
            error: state.error.clone(),
            info: state.info.clone(),
        }
    }

    pub fn matrix<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Vec<MatrixPoint> {
        let today = now.date_naive();
        self.lock()
            .tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .map(|t| MatrixPoint {
                id: t.id.clone(),
                title: t.title.clone(),
                importance: t.importance,
                urgency: t.urgency,
                quadrant: t.quadrant(),
                score: priority::score(t, today),
            })
            .collect()
    }

    async fn reload(&self) -> Result<(), AppError> {
        let tasks = self.store.fetch_tasks().await?;
        info!("Fetched {} tasks", tasks.len());
        self.lock().tasks = tasks;
        Ok(())
    }

    /// Replaces the cached list with the store's. On failure the last good
    /// list stays in place.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.lock().info = None;
        match self.reload().await {
            Ok(()) => {
                self.lock().error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Task fetch failed: {}", e);
                self.lock().error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Drag-end handler: moves the task locally, then persists the move.
    pub async fn move_task(
        &self,
        id: &str,
        target: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<MoveOutcome, AppError> {
        let request = {
            let mut state = self.lock();
            state.info = None;
            if state.in_flight.contains(id) {
                let err = AppError::Conflict(format!("Task {} is still being saved", id));
                state.error = Some(err.user_message());
                return Err(err);
            }

            let outcome = board::apply_drag_end(&state.tasks, id, target, now);
            let Some(request) = outcome.persist_request else {
                debug!("Ignoring drag of {} onto {}", id, target);
                return Ok(MoveOutcome::Unchanged);
            };
            state.tasks = outcome.next_tasks;
            state.in_flight.insert(id.to_string());
            request
        };

        let result = self.store.update_task_status(&request).await;
        self.lock().in_flight.remove(id);

        match result {
            Ok(()) => {
                info!("Moved task {} to {}", id, target);
                Ok(MoveOutcome::Persisted)
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Moving task {} to {} failed, reconciling: {}", id, target, e);
                if let Err(fetch_err) = self.reload().await {
                    warn!("Reconciling fetch failed: {}", fetch_err);
                }
                self.lock().error = Some(message.clone());
                Ok(MoveOutcome::Reconciled { message })
            }
        }
    }

    /// Deletes in the store first; local state only changes once the store
    /// confirms.
    pub async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        {
            let mut state = self.lock();
            state.info = None;
            if state.in_flight.contains(id) {
                let err = AppError::Conflict(format!("Task {} is still being saved", id));
                state.error = Some(err.user_message());
                return Err(err);
            }
            state.in_flight.insert(id.to_string());
        }

        let result = self.store.delete_task(id).await;

        let mut state = self.lock();
        state.in_flight.remove(id);
        match result {
            Ok(()) => {
                info!("Deleted task {}", id);
                state.tasks = board::apply_delete_confirmed(&state.tasks, id);
                state.info = Some(DELETED_NOTICE.to_string());
                Ok(())
            }
            Err(e) => {
                warn!("Deleting task {} failed: {}", id, e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Inserts a new todo. Store-side limits surface as the error notice.
    pub async fn add_task(&self, req: NewTaskRequest) -> Result<(), AppError> {
        let req = req.validate()?;
        self.lock().info = None;

        if let Err(e) = self.store.insert_task(&req).await {
            warn!("Adding task {:?} failed: {}", req.title, e);
            self.lock().error = Some(e.user_message());
            return Err(e);
        }
        info!("Added task {:?}", req.title);

        // A failed fetch is already recorded as the error notice.
        let _ = self.refresh().await;
        Ok(())
    }
}
