//! Folder ingestion: EXIF extraction into sessions.

pub mod discovery;
pub mod metadata;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ScannerConfig;
use crate::db::Database;
use crate::error::{ScanError, ScanResult};
use crate::models::Session;
use crate::tasks::ProgressSink;

pub use discovery::{
    count_raw_photos, detect_raw_folder, discover_images, find_target_folders, session_name_for,
};
pub use metadata::{extract_exif, PhotoExif};

/// Files read in parallel between two progress updates.
const EXTRACT_BATCH: usize = 32;

/// Folder name crawled for when none is given.
pub const DEFAULT_TARGET_FOLDER: &str = "Edited";

/// One folder to turn into a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(alias = "folder_path")]
    pub folder: PathBuf,
    pub session_name: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    /// Explicit RAW folder; otherwise a sibling folder is looked up.
    pub raw_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractOutcome {
    pub session: Session,
    /// `false` when a session with the same name, category and group was
    /// already stored and returned untouched.
    pub created: bool,
    pub photos_inserted: usize,
    /// Files whose EXIF block could not be read; stored without metadata.
    pub unreadable: usize,
}

fn read_photo(path: &Path) -> (PhotoExif, bool) {
    match extract_exif(path) {
        Ok(photo) => (photo, true),
        Err(e) => {
            warn!("No EXIF for {}: {:#}", path.display(), e);
            (PhotoExif::bare(path), false)
        }
    }
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| folder.to_string_lossy().to_string())
}

/// Extract every image below `request.folder` into a new session.
///
/// RAW frames are counted in the explicit RAW folder or a sibling named like
/// one; no folder leaves `total_raw_photos` unset. A session that already
/// exists under the same name, category and group is returned as is.
pub fn extract_folder(
    db: &Database,
    config: &ScannerConfig,
    request: &ExtractRequest,
    progress: &dyn ProgressSink,
) -> ScanResult<ExtractOutcome> {
    let folder = &request.folder;
    if !folder.is_dir() {
        return Err(ScanError::FolderNotFound(folder.clone()));
    }

    let name = request
        .session_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| folder_name(folder));

    if let Some(session) =
        db.find_session(&name, request.category.as_deref(), request.group.as_deref())?
    {
        info!("Session already exists: {} (ID: {})", session.name, session.id);
        progress.completed(&format!("Session {} already exists", session.name));
        return Ok(ExtractOutcome {
            session,
            created: false,
            photos_inserted: 0,
            unreadable: 0,
        });
    }

    let images = discover_images(folder, &config.image_extensions);
    if images.is_empty() {
        return Err(ScanError::NoImages(folder.clone()));
    }
    info!("Found {} image files in {}", images.len(), folder.display());

    let raw_folder = request
        .raw_folder
        .clone()
        .or_else(|| detect_raw_folder(folder, &config.raw_folder_names));
    let total_raw_photos = raw_folder
        .as_deref()
        .and_then(|raw| count_raw_photos(raw, &config.raw_extensions));

    let total = images.len();
    progress.started(total);

    let mut photos = Vec::with_capacity(total);
    let mut unreadable = 0;
    for batch in images.chunks(EXTRACT_BATCH) {
        let read: Vec<(PhotoExif, bool)> = batch.par_iter().map(|p| read_photo(p)).collect();
        for (photo, ok) in read {
            if !ok {
                unreadable += 1;
            }
            photos.push(photo);
        }
        progress.progress(photos.len(), total, &format!("Reading EXIF from {}", name));
    }

    let date = request.date.or_else(|| {
        photos
            .iter()
            .filter_map(|p| p.date_taken)
            .min()
            .map(|d| d.date())
    });

    let session = Session {
        name: name.clone(),
        category: request.category.clone(),
        group: request.group.clone(),
        date,
        description: request.description.clone(),
        folder_path: Some(folder.to_string_lossy().to_string()),
        raw_folder_path: raw_folder.map(|p| p.to_string_lossy().to_string()),
        total_photos: 0,
        total_raw_photos,
        ..Default::default()
    };
    let (session, photos_inserted) = db.create_session_with_photos(&session, &photos)?;

    match session.hit_rate {
        Some(rate) => info!(
            "Created session {} (ID: {}): {} photos, hit rate {:.1}%",
            session.name, session.id, session.total_photos, rate
        ),
        None => info!(
            "Created session {} (ID: {}): {} photos",
            session.name, session.id, session.total_photos
        ),
    }
    progress.completed(&format!(
        "Extracted {} photos into {}",
        photos_inserted, session.name
    ));

    Ok(ExtractOutcome {
        session,
        created: true,
        photos_inserted,
        unreadable,
    })
}

fn default_target_folder() -> String {
    DEFAULT_TARGET_FOLDER.to_string()
}

/// Extract every folder named `target_folder` below `parent_dir`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    pub parent_dir: PathBuf,
    #[serde(default = "default_target_folder")]
    pub target_folder: String,
    pub category: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl CrawlRequest {
    pub fn new(parent_dir: impl Into<PathBuf>) -> Self {
        Self {
            parent_dir: parent_dir.into(),
            target_folder: default_target_folder(),
            category: None,
            group: None,
            description: None,
            date: None,
        }
    }
}

/// Result for one crawled folder.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub folder: String,
    pub success: bool,
    pub session_id: Option<i64>,
    pub session_name: Option<String>,
    pub total_photos: Option<i64>,
    pub hit_rate: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub sessions: Vec<CrawlResult>,
}

/// Crawl `request.parent_dir`, extracting each matching folder. One folder
/// failing does not stop the others.
pub fn crawl(
    db: &Database,
    config: &ScannerConfig,
    request: &CrawlRequest,
    progress: &dyn ProgressSink,
) -> ScanResult<CrawlSummary> {
    if !request.parent_dir.is_dir() {
        return Err(ScanError::FolderNotFound(request.parent_dir.clone()));
    }

    let folders = find_target_folders(&request.parent_dir, &request.target_folder);
    info!(
        "Crawling {}: {} folders named '{}'",
        request.parent_dir.display(),
        folders.len(),
        request.target_folder
    );

    let total = folders.len();
    progress.started(total);
    let mut summary = CrawlSummary {
        total,
        ..Default::default()
    };

    for (index, folder) in folders.iter().enumerate() {
        let session_name = session_name_for(folder, &config.skip_folder_names);
        progress.progress(index, total, &format!("Extracting {}", session_name));

        let extract = ExtractRequest {
            folder: folder.clone(),
            session_name: Some(session_name),
            category: request.category.clone(),
            group: request.group.clone(),
            description: request.description.clone(),
            date: request.date,
            raw_folder: None,
        };

        let folder_display = folder.to_string_lossy().to_string();
        match extract_folder(db, config, &extract, &crate::tasks::NoProgress) {
            Ok(outcome) => {
                summary.successful += 1;
                summary.sessions.push(CrawlResult {
                    folder: folder_display,
                    success: true,
                    session_id: Some(outcome.session.id),
                    session_name: Some(outcome.session.name),
                    total_photos: Some(outcome.session.total_photos),
                    hit_rate: outcome.session.hit_rate,
                    error: None,
                });
            }
            Err(e) => {
                warn!("Error processing {}: {}", folder_display, e);
                summary.failed += 1;
                summary.sessions.push(CrawlResult {
                    folder: folder_display,
                    success: false,
                    session_id: None,
                    session_name: None,
                    total_photos: None,
                    hit_rate: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    progress.completed(&format!(
        "Crawl finished: {} extracted, {} failed",
        summary.successful, summary.failed
    ));
    Ok(summary)
}
