use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const MESSAGE_RATE_LIMIT: &str =
    "Easy there! You can only add one task per second. Please try again.";
pub const MESSAGE_TASK_LIMIT: &str =
    "You already have 30 active tasks. Complete or delete one before adding another.";
pub const MESSAGE_CAPACITY: &str =
    "PriorityMatrix has reached its user capacity. Please try again later or contact support.";
pub const MESSAGE_UNAUTHENTICATED: &str = "Authentication required. Please sign in to continue.";
pub const MESSAGE_DEFAULT: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Active task limit reached")]
    TaskLimitReached,

    #[error("Task insert rate limit exceeded")]
    RateLimited,

    #[error("User capacity reached")]
    CapacityReached,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Classifies a rejection from the remote store. The backend's row-level
    /// policies raise errors whose message carries a short code.
    pub fn from_remote(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("PMTRL") || message.contains("TASK_RATE_LIMIT") {
            AppError::RateLimited
        } else if message.contains("PMTMA") || message.contains("TASK_CAP_REACHED") {
            AppError::TaskLimitReached
        } else if message.contains("PMCAP") {
            AppError::CapacityReached
        } else if message.contains("PMNUL") {
            AppError::Unauthenticated
        } else {
            AppError::Remote { status, message }
        }
    }

    /// Text shown to the user in the board's error banner.
    pub fn user_message(&self) -> String {
        match self {
            AppError::RateLimited => MESSAGE_RATE_LIMIT.to_string(),
            AppError::TaskLimitReached => MESSAGE_TASK_LIMIT.to_string(),
            AppError::CapacityReached => MESSAGE_CAPACITY.to_string(),
            AppError::Unauthenticated => MESSAGE_UNAUTHENTICATED.to_string(),
            AppError::Remote { message, .. } if message.is_empty() => MESSAGE_DEFAULT.to_string(),
            AppError::Remote { message, .. } => message.clone(),
            AppError::NotFound => "Task not found".to_string(),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Http(_)
            | AppError::Config(_) => MESSAGE_DEFAULT.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::TaskLimitReached | AppError::CapacityReached => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Remote { .. } | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Migration(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Database(e) => error!("database error: {}", e),
            AppError::Migration(e) => error!("migration error: {}", e),
            AppError::Http(e) => error!("remote store transport error: {}", e),
            AppError::Config(msg) => error!("configuration error: {}", msg),
            _ => {}
        }

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.user_message(),
        });

        (status, body).into_response()
    }
}
