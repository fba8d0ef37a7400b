use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::TaskStore;
use crate::board::PersistRequest;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, TaskStatus};

/// Local SQLite-backed store for running without a Supabase project.
#[derive(Clone)]
pub struct SqliteTaskStore {
    db: SqlitePool,
}

#[derive(Debug, FromRow)]
struct TodoRecord {
    id: String,
    title: String,
    due_date: Option<NaiveDate>,
    importance: i32,
    urgency: i32,
    status: String,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TodoRecord> for Task {
    type Error = AppError;

    fn try_from(r: TodoRecord) -> Result<Self, Self::Error> {
        Ok(Task {
            id: r.id,
            title: r.title,
            due_date: r.due_date,
            importance: r.importance,
            urgency: r.urgency,
            status: r.status.parse()?,
            completed_at: r.completed_at,
            created_at: r.created_at,
        })
    }
}

impl SqliteTaskStore {
    /// Applies the bundled migrations to an existing pool.
    pub async fn from_pool(db: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(db).await
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, AppError> {
        let records = sqlx::query_as::<_, TodoRecord>(
            r#"
            SELECT id, title, due_date, importance, urgency, status, completed_at, created_at
            FROM todos
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        records.into_iter().map(Task::try_from).collect()
    }

    async fn update_task_status(&self, req: &PersistRequest) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE todos SET status = ?1, completed_at = ?2 WHERE id = ?3")
            .bind(req.status.as_str())
            .bind(req.completed_at)
            .bind(&req.id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn insert_task(&self, req: &NewTaskRequest) -> Result<(), AppError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO todos
                (id, title, due_date, importance, urgency, status, position, completed_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7)
            "#,
        )
        .bind(&id)
        .bind(&req.title)
        .bind(req.due_date)
        .bind(req.importance)
        .bind(req.urgency)
        .bind(TaskStatus::Todo.as_str())
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
