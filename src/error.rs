use thiserror::Error;

/// Failure of an analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The requested scope resolved to no sessions at all, as opposed to a
    /// valid scope whose photos were all filtered out.
    #[error("No sessions found for {scope}")]
    EmptyScope { scope: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Failure to ingest a folder.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory not found: {}", .0.display())]
    FolderNotFound(std::path::PathBuf),

    #[error("No image files found in {}", .0.display())]
    NoImages(std::path::PathBuf),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
