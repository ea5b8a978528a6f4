//! HTTP API over the store and the statistics engine.

pub mod analysis;
pub mod database;
pub mod error;
pub mod health;
pub mod ingest;

use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::tasks::{ProgressTracker, TaskId, TaskKind, TaskUpdate};

pub use error::{AppError, AppResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub progress: Arc<Mutex<ProgressTracker>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            progress: Arc::new(Mutex::new(ProgressTracker::new())),
            config: Arc::new(config),
        }
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn with_db<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Database) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| AppError::Internal("database lock poisoned".to_string()))?;
            f(&db)
        })
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
    }

    /// Register a task for progress polling under `requested` or a fresh id.
    pub fn register_task(
        &self,
        requested: Option<String>,
        kind: TaskKind,
    ) -> AppResult<(TaskId, std::sync::mpsc::Sender<TaskUpdate>)> {
        let id = requested
            .filter(|id| !id.trim().is_empty())
            .map(TaskId::new)
            .unwrap_or_else(|| TaskId::generate(kind));
        let mut tracker = self
            .progress
            .lock()
            .map_err(|_| AppError::Internal("progress lock poisoned".to_string()))?;
        tracker.forget_finished();
        let tx = tracker.register(id.clone(), kind);
        Ok((id, tx))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/analyze", post(analysis::analyze))
        .route("/api/wrapped", post(analysis::wrapped))
        .route("/api/lenses/summary", get(analysis::lens_summary))
        .route("/api/sessions", get(database::list_sessions))
        .route(
            "/api/sessions/:id",
            put(database::update_session).delete(database::delete_session),
        )
        .route("/api/database/overview", get(database::overview))
        .route(
            "/api/database/categories-groups",
            get(database::categories_groups),
        )
        .route(
            "/api/database/delete-category",
            post(database::delete_categories),
        )
        .route("/api/database/delete-group", post(database::delete_groups))
        .route("/api/database/reset", post(database::reset))
        .route("/api/extract", post(ingest::extract))
        .route("/api/crawl", post(ingest::crawl));

    Router::new()
        .merge(api)
        .merge(health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
