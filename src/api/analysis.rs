//! Analysis, temporal trends and lens usage endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AppResult, AppState};
use crate::stats::{
    monthly_trends, Analysis, AnalysisRequest, Analyzer, FilterSpec, LensUsageSummary, Scope,
    Trends,
};
use crate::tasks::{ProgressSink, TaskId, TaskKind};

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub filters: FilterSpec,
    pub task_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub task_id: TaskId,
    pub analysis: Analysis,
}

/// POST /api/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> AppResult<Json<AnalyzeResponse>> {
    let (task_id, tx) = state.register_task(body.task_id, TaskKind::Analyze)?;
    debug!("Analyze request {}: scope {}", task_id, body.scope);

    let request = AnalysisRequest {
        scope: body.scope,
        filters: body.filters,
        name: body.name,
    };
    let analysis = state
        .with_db(move |db| Ok(Analyzer::new(db).analyze(&request, &tx)?))
        .await?;

    Ok(Json(AnalyzeResponse { task_id, analysis }))
}

#[derive(Debug, Deserialize)]
pub struct WrappedBody {
    pub category: String,
    pub group: String,
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WrappedResponse {
    pub task_id: TaskId,
    pub category: String,
    pub group: String,
    /// `None` when the category/group has no sessions.
    pub wrapped: Option<Trends>,
}

/// POST /api/wrapped
pub async fn wrapped(
    State(state): State<AppState>,
    Json(body): Json<WrappedBody>,
) -> AppResult<Json<WrappedResponse>> {
    let (task_id, tx) = state.register_task(body.task_id, TaskKind::Wrapped)?;
    let category = body.category.clone();
    let group = body.group.clone();

    let wrapped = state
        .with_db(move |db| {
            tx.started(3);
            tx.progress(0, 3, "Loading sessions");
            let sessions = db.list_sessions(Some(&category), Some(&group))?;
            if sessions.is_empty() {
                tx.completed("No sessions found for this category/group");
                return Ok(None);
            }

            tx.progress(1, 3, "Loading photos");
            let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
            let photos = db.get_photos_for_sessions(&ids)?;

            tx.progress(2, 3, "Analyzing trends");
            let trends = monthly_trends(&sessions, &photos);
            tx.completed(&format!("{} months of trends", trends.months.len()));
            Ok(Some(trends))
        })
        .await?;

    Ok(Json(WrappedResponse {
        task_id,
        category: body.category,
        group: body.group,
        wrapped,
    }))
}

/// GET /api/lenses/summary
pub async fn lens_summary(State(state): State<AppState>) -> AppResult<Json<LensUsageSummary>> {
    let summary = state.with_db(|db| Ok(db.lens_usage_summary()?)).await?;
    Ok(Json(summary))
}
