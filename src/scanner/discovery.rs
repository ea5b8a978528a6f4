use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| e.to_lowercase() == ext))
}

/// Image files under `directory` (recursively) with one of `extensions`,
/// compared case-insensitively.
pub fn discover_images(directory: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| has_extension(p, extensions))
        .collect();

    // Sort by path for consistent ordering
    images.sort();
    images
}

/// Number of RAW frames directly inside `raw_folder`, or `None` when the
/// folder cannot be read.
pub fn count_raw_photos(raw_folder: &Path, raw_extensions: &[String]) -> Option<i64> {
    if !raw_folder.is_dir() {
        return None;
    }
    let count = WalkDir::new(raw_folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), raw_extensions))
        .count();
    Some(count as i64)
}

/// First sibling of `edited_folder` named like a RAW folder.
pub fn detect_raw_folder(edited_folder: &Path, raw_folder_names: &[String]) -> Option<PathBuf> {
    let parent = edited_folder.parent()?;
    raw_folder_names
        .iter()
        .map(|name| parent.join(name))
        .find(|candidate| candidate.is_dir() && candidate != edited_folder)
}

/// Every directory below `parent` whose name equals `target`, ignoring case.
pub fn find_target_folders(parent: &Path, target: &str) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = WalkDir::new(parent)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(target))
        .map(|e| e.into_path())
        .collect();
    folders.sort();
    folders
}

/// Session name for a crawled folder: the nearest path component (starting
/// at the folder itself) that is not a generic name like "edited", with
/// spaces replaced by underscores.
pub fn session_name_for(folder: &Path, skip_names: &[String]) -> String {
    let nearest = folder
        .components()
        .rev()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .filter(|part| !part.is_empty() && part != "/")
        .find(|part| !skip_names.iter().any(|s| s.eq_ignore_ascii_case(part)));

    nearest
        .or_else(|| {
            folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_default()
        .replace(' ', "_")
}
