pub mod dto;
pub mod memory;
pub mod sqlite;
pub mod supabase;

use async_trait::async_trait;

use crate::board::PersistRequest;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task};

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;
pub use supabase::{SupabaseConfig, SupabaseTaskStore};

/// The authoritative task store. Every call is a single independent remote
/// operation; atomicity is the store's concern.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All of the session user's tasks, newest `created_at` first.
    async fn fetch_tasks(&self) -> Result<Vec<Task>, AppError>;
    async fn update_task_status(&self, req: &PersistRequest) -> Result<(), AppError>;
    async fn delete_task(&self, id: &str) -> Result<(), AppError>;
    /// Capacity and rate limits are enforced by the store and come back as
    /// `AppError::TaskLimitReached` / `AppError::RateLimited`.
    async fn insert_task(&self, req: &NewTaskRequest) -> Result<(), AppError>;
}
