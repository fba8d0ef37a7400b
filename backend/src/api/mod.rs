use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::routing::{delete, patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{NewTaskRequest, TaskStatus};
use crate::services::{BoardView, MatrixPoint};
use crate::state::AppState;

#[derive(Deserialize)]
struct MoveTaskRequest {
    status: TaskStatus,
}

/// The caller's UTC offset, so due dates are counted from their calendar day.
#[derive(Deserialize)]
struct ViewParams {
    #[serde(default)]
    tz_offset_minutes: Option<i32>,
}

impl ViewParams {
    fn local_now(&self) -> Result<DateTime<FixedOffset>, AppError> {
        let minutes = self.tz_offset_minutes.unwrap_or(0);
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::BadRequest(format!("tz_offset_minutes out of range: {}", minutes))
            })?;
        Ok(Utc::now().with_timezone(&offset))
    }
}

type ViewQuery = Result<Query<ViewParams>, QueryRejection>;

fn view_params(query: ViewQuery) -> Result<ViewParams, AppError> {
    let Query(params) = query?;
    Ok(params)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/board", get(show_board))
        .route("/board/refresh", post(refresh_board))
        .route("/matrix", get(show_matrix))
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", delete(delete_task))
        .route("/tasks/{id}/status", patch(move_task))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn show_board(
    State(state): State<AppState>,
    query: ViewQuery,
) -> Result<Json<BoardView>, AppError> {
    let now = view_params(query)?.local_now()?;
    Ok(Json(state.board.view(now)))
}

/// A failed fetch is reported in the view's `error`, over the last good list.
async fn refresh_board(
    State(state): State<AppState>,
    query: ViewQuery,
) -> Result<Json<BoardView>, AppError> {
    let params = view_params(query)?;
    let _ = state.board.refresh().await;
    Ok(Json(state.board.view(params.local_now()?)))
}

async fn show_matrix(
    State(state): State<AppState>,
    query: ViewQuery,
) -> Result<Json<Vec<MatrixPoint>>, AppError> {
    let now = view_params(query)?.local_now()?;
    Ok(Json(state.board.matrix(now)))
}

async fn create_task(
    State(state): State<AppState>,
    query: ViewQuery,
    payload: Result<Json<NewTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BoardView>), AppError> {
    let params = view_params(query)?;
    let Json(req) = payload?;
    state.board.add_task(req).await?;
    Ok((StatusCode::CREATED, Json(state.board.view(params.local_now()?))))
}

async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: ViewQuery,
    payload: Result<Json<MoveTaskRequest>, JsonRejection>,
) -> Result<Json<BoardView>, AppError> {
    let params = view_params(query)?;
    let Json(req) = payload?;
    state.board.move_task(&id, req.status, Utc::now()).await?;
    Ok(Json(state.board.view(params.local_now()?)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: ViewQuery,
) -> Result<Json<BoardView>, AppError> {
    let params = view_params(query)?;
    state.board.delete_task(&id).await?;
    Ok(Json(state.board.view(params.local_now()?)))
}
