use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{AnalysisError, ScanError};

/// Error type for HTTP handlers, rendered as `{"error", "code"}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),

            AppError::Analysis(err) => match err {
                AnalysisError::EmptyScope { .. } => {
                    (StatusCode::NOT_FOUND, "EMPTY_SCOPE", err.to_string())
                }
                AnalysisError::Store(e) => internal(e),
            },

            AppError::Scan(err) => match err {
                ScanError::FolderNotFound(_) => {
                    (StatusCode::NOT_FOUND, "FOLDER_NOT_FOUND", err.to_string())
                }
                ScanError::NoImages(_) => (StatusCode::BAD_REQUEST, "NO_IMAGES", err.to_string()),
                ScanError::Store(e) => internal(e),
            },

            AppError::Store(e) => internal(e),
            AppError::Internal(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
