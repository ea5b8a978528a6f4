//! Session maintenance and database overview endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AppError, AppResult, AppState};
use crate::db::{DatabaseOverview, DeleteCounts, SessionUpdate};
use crate::models::Session;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub category: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Json<SessionsResponse>> {
    let category = non_empty(query.category);
    let group = non_empty(query.group);
    let sessions = state
        .with_db(move |db| Ok(db.list_sessions(category.as_deref(), group.as_deref())?))
        .await?;
    Ok(Json(SessionsResponse { sessions }))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// PUT /api/sessions/:id
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<SessionUpdate>,
) -> AppResult<Json<SessionResponse>> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Session name cannot be empty".to_string()));
    }
    if update.total_raw_photos.is_some_and(|raw| raw < 0) {
        return Err(AppError::BadRequest(
            "total_raw_photos cannot be negative".to_string(),
        ));
    }

    let session = state
        .with_db(move |db| Ok(db.update_session(id, &update)?))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;

    info!("Updated session {}: {} (hit rate {:?})", id, session.name, session.hit_rate);
    Ok(Json(SessionResponse { session }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = state.with_db(move |db| Ok(db.delete_session(id)?)).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Session {} not found", id)));
    }
    info!("Deleted session {}", id);
    Ok(Json(MessageResponse {
        message: format!("Session {} deleted", id),
    }))
}

/// GET /api/database/overview
pub async fn overview(State(state): State<AppState>) -> AppResult<Json<DatabaseOverview>> {
    let overview = state.with_db(|db| Ok(db.overview()?)).await?;
    Ok(Json(overview))
}

#[derive(Debug, Serialize)]
pub struct CategoriesGroupsResponse {
    pub categories: Vec<String>,
    pub groups: Vec<String>,
}

/// GET /api/database/categories-groups
pub async fn categories_groups(
    State(state): State<AppState>,
) -> AppResult<Json<CategoriesGroupsResponse>> {
    let (categories, groups) = state
        .with_db(|db| Ok((db.categories()?, db.groups()?)))
        .await?;
    Ok(Json(CategoriesGroupsResponse { categories, groups }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoriesBody {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteGroupsBody {
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: DeleteCounts,
}

/// POST /api/database/delete-category
pub async fn delete_categories(
    State(state): State<AppState>,
    Json(body): Json<DeleteCategoriesBody>,
) -> AppResult<Json<DeleteResponse>> {
    if body.categories.is_empty() {
        return Err(AppError::BadRequest("No categories specified".to_string()));
    }
    let requested = body.categories.len();
    let deleted = state
        .with_db(move |db| Ok(db.delete_sessions_by_categories(&body.categories)?))
        .await?;
    Ok(Json(DeleteResponse {
        message: format!(
            "Deleted {} sessions from {} categories",
            deleted.sessions, requested
        ),
        deleted,
    }))
}

/// POST /api/database/delete-group
pub async fn delete_groups(
    State(state): State<AppState>,
    Json(body): Json<DeleteGroupsBody>,
) -> AppResult<Json<DeleteResponse>> {
    if body.groups.is_empty() {
        return Err(AppError::BadRequest("No groups specified".to_string()));
    }
    let requested = body.groups.len();
    let deleted = state
        .with_db(move |db| Ok(db.delete_sessions_by_groups(&body.groups)?))
        .await?;
    Ok(Json(DeleteResponse {
        message: format!("Deleted {} sessions from {} groups", deleted.sessions, requested),
        deleted,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub confirm: bool,
}

/// POST /api/database/reset
pub async fn reset(
    State(state): State<AppState>,
    Json(body): Json<ResetBody>,
) -> AppResult<Json<DeleteResponse>> {
    if !body.confirm {
        return Err(AppError::BadRequest("Confirmation required".to_string()));
    }
    let deleted = state.with_db(|db| Ok(db.reset()?)).await?;
    Ok(Json(DeleteResponse {
        message: "Database reset successfully".to_string(),
        deleted,
    }))
}
