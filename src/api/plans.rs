//! API endpoints for study plans.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::planner::{PlanTask, StudyPlan};
use crate::storage::StoredPlan;

use super::routes::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePlanRequest {
    /// Tasks to schedule. Stored tasks are used when omitted.
    #[serde(default)]
    pub tasks: Option<Vec<PlanTask>>,
    /// Persist the generated plan under its date.
    #[serde(default)]
    pub save: bool,
}

/// POST /api/plan
/// Generate today's plan. Falls back to the default schedule, never fails.
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GeneratePlanRequest>,
) -> Json<StudyPlan> {
    let tasks = match req.tasks {
        Some(tasks) => tasks,
        None => state.store.list().await.iter().map(PlanTask::from).collect(),
    };

    let plan = state.planner.generate(&tasks).await;

    if req.save && state.store.save_study_plan(plan.date, plan.clone()).await.is_none() {
        tracing::warn!("Generated plan for {} could not be saved", plan.date);
    }

    Json(plan)
}

/// GET /api/plans/:date
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<StoredPlan>, (StatusCode, String)> {
    state
        .store
        .study_plan(date)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no plan for {}", date)))
}

/// PUT /api/plans/:date
pub async fn save_plan(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
    Json(plan): Json<StudyPlan>,
) -> Result<Json<StoredPlan>, (StatusCode, String)> {
    state
        .store
        .save_study_plan(date, plan)
        .await
        .map(Json)
        .ok_or_else(|| (StatusCode::BAD_GATEWAY, "failed to save study plan".to_string()))
}
