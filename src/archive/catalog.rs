//! Existing archives in the archive directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::naming::ARCHIVE_EXTENSION;
use crate::error::{StashError, StashResult};

/// Metadata about an archive on disk
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Archive filename
    pub filename: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Local>,
    /// Size in bytes
    pub size_bytes: u64,
}

impl ArchiveInfo {
    /// Filename without the archive extension
    pub fn display_name(&self) -> &str {
        self.filename
            .strip_suffix(ARCHIVE_EXTENSION)
            .unwrap_or(&self.filename)
    }
}

/// List all archives in `dir`, newest first
///
/// A missing directory yields an empty list.
pub fn list_archives(dir: &Path) -> StashResult<Vec<ArchiveInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut archives = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| StashError::filesystem(dir, e))? {
        let entry = entry.map_err(|e| StashError::filesystem(dir, e))?;

        let path = entry.path();
        if let Some(info) = parse_archive_info(&path) {
            archives.push(info);
        }
    }

    archives.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    Ok(archives)
}

fn parse_archive_info(path: &Path) -> Option<ArchiveInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    if !filename.ends_with(ARCHIVE_EXTENSION) {
        return None;
    }

    let metadata = fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }

    Some(ArchiveInfo {
        filename,
        path: path.to_path_buf(),
        modified: DateTime::from(metadata.modified().ok()?),
        size_bytes: metadata.len(),
    })
}
