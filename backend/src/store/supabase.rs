use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};

use super::TaskStore;
use super::dto;
use crate::board::PersistRequest;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, TaskStatus};

const TODOS_TABLE: &str = "todos";

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Session JWT of the signed-in user. Falls back to the anon key.
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

impl SupabaseConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            access_token: env::var("SUPABASE_ACCESS_TOKEN").ok(),
            user_id: env::var("SUPABASE_USER_ID").ok(),
        })
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }
}

/// Talks to the Supabase PostgREST endpoint for the `todos` table.
pub struct SupabaseTaskStore {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseTaskStore {
    pub fn new(config: SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, TODOS_TABLE)
    }

    /// `?id=eq.<id>` with the id percent-encoded, so it cannot add filters.
    fn row_url(&self, id: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.table_url())
            .map_err(|e| AppError::Config(format!("SUPABASE_URL is invalid: {}", e)))?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.config.bearer()))
    }

    async fn check(response: Response, action: &str) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: dto::PostgrestError = serde_json::from_str(&body).unwrap_or_default();
        // Limit codes may sit in any of these fields depending on how the
        // policy raised them.
        let combined = [
            parsed.code.as_deref().unwrap_or_default(),
            parsed.message.as_str(),
            parsed.details.as_deref().unwrap_or_default(),
            parsed.hint.as_deref().unwrap_or_default(),
        ]
        .join(" ");
        let err = AppError::from_remote(status.as_u16(), combined.trim().to_string());
        tracing::warn!("Supabase rejected {}: {} {}", action, status, body);

        match err {
            AppError::Remote { status, .. } => Err(AppError::Remote {
                status,
                message: if parsed.message.is_empty() { body } else { parsed.message },
            }),
            other => Err(other),
        }
    }
}

impl From<dto::TodoRow> for Task {
    fn from(row: dto::TodoRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            due_date: row.due_date,
            importance: row.importance,
            urgency: row.urgency,
            status: row.status,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TaskStore for SupabaseTaskStore {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, AppError> {
        let url = format!("{}?select=*&order=created_at.desc", self.table_url());
        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "fetch").await?;

        let rows: Vec<dto::TodoRow> = response.json().await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task_status(&self, req: &PersistRequest) -> Result<(), AppError> {
        let body = dto::UpdateStatusBody {
            status: req.status,
            completed_at: req.completed_at,
        };
        let response = self
            .authorized(self.client.patch(self.row_url(&req.id)?))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;
        Self::check(response, "status update").await?;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let response = self
            .authorized(self.client.delete(self.row_url(id)?))
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        Self::check(response, "delete").await?;
        Ok(())
    }

    async fn insert_task(&self, req: &NewTaskRequest) -> Result<(), AppError> {
        let body = dto::InsertTodoBody {
            title: &req.title,
            due_date: req.due_date,
            importance: req.importance,
            urgency: req.urgency,
            status: TaskStatus::Todo,
            position: 0,
            user_id: self.config.user_id.as_deref(),
        };
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;
        Self::check(response, "insert").await?;
        Ok(())
    }
}
