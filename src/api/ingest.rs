//! Folder ingestion endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{AppResult, AppState};
use crate::scanner::{self, CrawlRequest, CrawlSummary, ExtractOutcome, ExtractRequest};
use crate::tasks::{ProgressSink, TaskId, TaskKind};

#[derive(Debug, Deserialize)]
pub struct ExtractBody {
    #[serde(flatten)]
    pub request: ExtractRequest,
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub outcome: ExtractOutcome,
}

/// POST /api/extract
pub async fn extract(
    State(state): State<AppState>,
    Json(body): Json<ExtractBody>,
) -> AppResult<Json<ExtractResponse>> {
    let (task_id, tx) = state.register_task(body.task_id, TaskKind::Extract)?;
    let config = state.config.scanner.clone();
    let request = body.request;

    let outcome = state
        .with_db(move |db| {
            let result = scanner::extract_folder(db, &config, &request, &tx);
            if let Err(e) = &result {
                tx.failed(&e.to_string());
            }
            Ok(result?)
        })
        .await?;

    Ok(Json(ExtractResponse { task_id, outcome }))
}

#[derive(Debug, Deserialize)]
pub struct CrawlBody {
    #[serde(flatten)]
    pub request: CrawlRequest,
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pub task_id: TaskId,
    #[serde(flatten)]
    pub summary: CrawlSummary,
}

/// POST /api/crawl
pub async fn crawl(
    State(state): State<AppState>,
    Json(body): Json<CrawlBody>,
) -> AppResult<Json<CrawlResponse>> {
    let (task_id, tx) = state.register_task(body.task_id, TaskKind::Crawl)?;
    let config = state.config.scanner.clone();
    let request = body.request;

    let summary = state
        .with_db(move |db| {
            let result = scanner::crawl(db, &config, &request, &tx);
            if let Err(e) = &result {
                tx.failed(&e.to_string());
            }
            Ok(result?)
        })
        .await?;

    Ok(Json(CrawlResponse { task_id, summary }))
}
