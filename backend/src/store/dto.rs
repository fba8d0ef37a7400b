use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TaskStatus;

/// Row of the `todos` table as PostgREST returns it.
#[derive(Debug, Deserialize)]
pub struct TodoRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub importance: i32,
    pub urgency: i32,
    pub status: TaskStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusBody {
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct InsertTodoBody<'a> {
    pub title: &'a str,
    pub due_date: Option<NaiveDate>,
    pub importance: i32,
    pub urgency: i32,
    pub status: TaskStatus,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

/// PostgREST error payload.
#[derive(Debug, Default, Deserialize)]
pub struct PostgrestError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}
