//! Archive index reading
//!
//! Lists the entries stored in a `.tar.gz` archive without writing anything
//! to disk.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::{Archive, Entry};

use crate::error::{StashError, StashResult};

/// Open an archive for sequential reading
pub(crate) fn open(archive: &Path) -> StashResult<Archive<GzDecoder<BufReader<File>>>> {
    let file = File::open(archive).map_err(|e| StashError::archive_read(archive, e))?;
    Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
}

/// Normalized File Entry name of a tar entry
///
/// Strips a leading `./`, marks directories with a trailing `/` and returns
/// `None` for the archive root itself.
pub(crate) fn entry_name<R: Read>(entry: &Entry<'_, R>) -> StashResult<Option<String>> {
    let path = entry
        .path()
        .map_err(|e| StashError::Io(format!("Invalid entry path: {}", e)))?;
    let is_dir = entry.header().entry_type().is_dir();
    Ok(normalize_entry(&path.to_string_lossy(), is_dir))
}

/// Normalize a raw archive path into File Entry form
pub fn normalize_entry(raw: &str, is_dir: bool) -> Option<String> {
    let mut name = raw.replace('\\', "/");
    while let Some(stripped) = name.strip_prefix("./") {
        name = stripped.to_string();
    }
    let name = name.trim_end_matches('/');
    if name.is_empty() || name == "." {
        return None;
    }

    let mut name = name.to_string();
    if is_dir {
        name.push('/');
    }
    Some(name)
}

/// List every entry path in the archive, in archive order
pub fn list_entries(archive: &Path) -> StashResult<Vec<String>> {
    let mut reader = open(archive)?;
    let entries = reader
        .entries()
        .map_err(|e| StashError::archive_read(archive, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StashError::archive_read(archive, e))?;
        if let Some(name) =
            entry_name(&entry).map_err(|e| StashError::archive_read(archive, e))?
        {
            names.push(name);
        }
    }

    tracing::debug!("Listed {} entries in {}", names.len(), archive.display());
    Ok(names)
}
