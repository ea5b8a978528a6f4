//! Health check and task progress endpoints

use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::{AppError, AppResult, AppState};
use crate::tasks::TaskId;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub task_id: String,
    pub percentage: u8,
    pub progress: usize,
    pub total: usize,
    pub status: String,
    pub message: Option<String>,
}

/// GET /api/progress/:task_id
///
/// Unknown ids answer with status `unknown` rather than an error, so a
/// client may start polling before its request has registered the task.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<ProgressResponse>> {
    let mut tracker = state
        .progress
        .lock()
        .map_err(|_| AppError::Internal("progress lock poisoned".to_string()))?;

    let response = match tracker.status(&TaskId::new(task_id.clone())) {
        Some(status) => ProgressResponse {
            task_id,
            percentage: status.progress,
            progress: status.current,
            total: status.total,
            status: status.status.to_string(),
            message: status.message,
        },
        None => ProgressResponse {
            task_id,
            percentage: 0,
            progress: 0,
            total: 0,
            status: "unknown".to_string(),
            message: None,
        },
    };
    Ok(Json(response))
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/progress/:task_id", get(get_progress))
}
