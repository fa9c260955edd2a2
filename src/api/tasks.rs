//! API endpoints for stored tasks.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::task::{NewTask, Task, TaskPatch};

use super::routes::AppState;

/// GET /api/tasks
/// All tasks, earliest deadline first.
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    Json(state.store.list().await)
}

/// GET /api/tasks/date/:date
pub async fn list_tasks_for_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Json<Vec<Task>> {
    Json(state.store.list_for_date(date).await)
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title must not be empty".to_string()));
    }
    state
        .store
        .save(req)
        .await
        .map(|task| (StatusCode::CREATED, Json(task)))
        .ok_or_else(|| (StatusCode::BAD_GATEWAY, "failed to save task".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct QuickAddRequest {
    pub text: String,
}

/// POST /api/tasks/quick
/// Extract a task from free text and store it in one step.
pub async fn quick_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuickAddRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    let parsed = state.extractor.extract(&req.text).await;
    state
        .store
        .save(parsed.into())
        .await
        .map(|task| (StatusCode::CREATED, Json(task)))
        .ok_or_else(|| (StatusCode::BAD_GATEWAY, "failed to save task".to_string()))
}

/// PATCH /api/tasks/:id
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .store
        .update(id, patch)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("task {} not found", id)))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.store.delete(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
