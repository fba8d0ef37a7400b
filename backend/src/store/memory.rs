use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::TaskStore;
use crate::board::PersistRequest;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, TaskStatus};

/// Which call the next injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Fetch,
    Update,
    Delete,
    Insert,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    failures: Vec<(FailOn, AppError)>,
    updates: Vec<PersistRequest>,
    deletes: Vec<String>,
    fetches: usize,
    update_gate: Option<Arc<Semaphore>>,
}

/// In-process store holding tasks newest-first. Failures can be queued per
/// call kind; each queued failure is consumed by the next matching call.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<Inner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store. Tasks are re-ordered newest `created_at` first.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.tasks = tasks;
            inner.tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        store
    }

    pub fn fail_next(&self, on: FailOn, err: AppError) {
        self.lock().failures.push((on, err));
    }

    /// Makes status updates wait until a permit is added to the returned
    /// semaphore, one permit per update.
    pub fn gate_updates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().update_gate = Some(gate.clone());
        gate
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn updates(&self) -> Vec<PersistRequest> {
        self.lock().updates.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.lock().deletes.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(inner: &mut Inner, on: FailOn) -> Result<(), AppError> {
        match inner.failures.iter().position(|(kind, _)| *kind == on) {
            Some(idx) => Err(inner.failures.remove(idx).1),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, AppError> {
        let mut inner = self.lock();
        inner.fetches += 1;
        Self::take_failure(&mut inner, FailOn::Fetch)?;
        Ok(inner.tasks.clone())
    }

    async fn update_task_status(&self, req: &PersistRequest) -> Result<(), AppError> {
        let gate = self.lock().update_gate.clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut inner = self.lock();
        inner.updates.push(req.clone());
        Self::take_failure(&mut inner, FailOn::Update)?;

        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == req.id)
            .ok_or(AppError::NotFound)?;
        task.status = req.status;
        task.completed_at = req.completed_at;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.deletes.push(id.to_string());
        Self::take_failure(&mut inner, FailOn::Delete)?;

        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn insert_task(&self, req: &NewTaskRequest) -> Result<(), AppError> {
        let mut inner = self.lock();
        Self::take_failure(&mut inner, FailOn::Insert)?;

        inner.tasks.insert(
            0,
            Task {
                id: Uuid::new_v4().to_string(),
                title: req.title.clone(),
                due_date: req.due_date,
                importance: req.importance,
                urgency: req.urgency,
                status: TaskStatus::Todo,
                completed_at: None,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }
}
