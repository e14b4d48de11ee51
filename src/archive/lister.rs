//! Recursive directory listing
//!
//! Produces File Entries relative to a base directory in pre-order (a
//! directory marker comes right before its contents), with siblings sorted by
//! name so listings are reproducible.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{StashError, StashResult};

/// Convert a relative filesystem path to File Entry form
pub fn entry_name(relative: &Path, is_dir: bool) -> String {
    let mut name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");
    if is_dir {
        name.push('/');
    }
    name
}

/// Whether a File Entry names a directory
pub fn is_dir_entry(entry: &str) -> bool {
    entry.ends_with('/')
}

/// List everything under `base`, relative to `base`
///
/// Symbolic links are never followed, so link cycles cannot recurse; a link
/// pointing at a directory is listed as a directory marker without its
/// contents. A missing base yields an empty listing.
pub fn list_all(base: &Path) -> StashResult<Vec<String>> {
    list_under(base, base)
}

/// List `dir` itself and everything under it, relative to `base`
///
/// Used for subtree scans, where paths must stay comparable with archive
/// entries rooted at `base`.
pub fn list_subtree(base: &Path, dir: &Path) -> StashResult<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let relative = dir
        .strip_prefix(base)
        .map_err(|e| StashError::filesystem(dir, e))?;

    let mut entries = Vec::new();
    if !relative.as_os_str().is_empty() {
        entries.push(entry_name(relative, true));
    }
    entries.extend(list_under(base, dir)?);
    Ok(entries)
}

fn list_under(base: &Path, start: &Path) -> StashResult<Vec<String>> {
    if !start.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();

    for entry in WalkDir::new(start)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(start).to_path_buf();
            StashError::filesystem(path, e)
        })?;

        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|e| StashError::filesystem(entry.path(), e))?;

        // links are plain entries, even when they point at a directory
        entries.push(entry_name(relative, entry.file_type().is_dir()));
    }

    Ok(entries)
}
