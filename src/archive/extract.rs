//! Archive extraction
//!
//! Unpacks all or some entries of an archive into a directory, optionally
//! leaving newer live files alone.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{debug, warn};

use super::index::{entry_name, open};
use super::lister::is_dir_entry;
use crate::error::{StashError, StashResult};

/// How existing live files are treated during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Overwrite every live file
    #[default]
    All,
    /// Skip live files that are not older than the archived copy
    NewerOnly,
}

/// Counts from one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub skipped: usize,
}

/// A set of selected archive entries
///
/// A selected directory selects its whole subtree.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    exact: HashSet<String>,
    dirs: Vec<String>,
}

impl Selection {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Selection::default();
        for path in paths {
            let path = path.into();
            if is_dir_entry(&path) {
                selection.dirs.push(path.clone());
            }
            selection.exact.insert(path);
        }
        selection
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.exact.contains(entry) || self.dirs.iter().any(|dir| entry.starts_with(dir.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Extract entries of `archive` into `destination`
///
/// With a selection only matching entries are unpacked. Entry modification
/// times are preserved, which keeps later newer-only runs meaningful.
pub fn extract(
    archive: &Path,
    destination: &Path,
    selection: Option<&Selection>,
    mode: ExtractMode,
) -> StashResult<ExtractSummary> {
    let mut reader = open(archive)?;
    reader.set_preserve_mtime(true);
    reader.set_overwrite(true);

    let entries = reader
        .entries()
        .map_err(|e| StashError::archive_read(archive, e))?;

    let mut summary = ExtractSummary::default();

    for entry in entries {
        let mut entry = entry.map_err(|e| StashError::archive_read(archive, e))?;
        let Some(name) = entry_name(&entry).map_err(|e| StashError::archive_read(archive, e))?
        else {
            continue;
        };

        if let Some(selection) = selection {
            if !selection.contains(&name) {
                continue;
            }
        }

        let target = destination.join(name.trim_end_matches('/'));

        if mode == ExtractMode::NewerOnly && !is_dir_entry(&name) {
            let archived = entry
                .header()
                .mtime()
                .map_err(|e| StashError::archive_read(archive, e))?;
            if live_is_not_older(&target, archived) {
                debug!("Keeping newer live file {}", name);
                summary.skipped += 1;
                continue;
            }
        }

        let unpacked = entry
            .unpack_in(destination)
            .map_err(|e| StashError::filesystem(&target, e))?;

        if unpacked {
            summary.extracted += 1;
        } else {
            warn!("Skipped entry outside of the destination: {}", name);
            summary.skipped += 1;
        }
    }

    debug!(
        "Extracted {} entries from {} ({} skipped)",
        summary.extracted,
        archive.display(),
        summary.skipped
    );

    Ok(summary)
}

fn live_is_not_older(target: &Path, archived_secs: u64) -> bool {
    let Ok(metadata) = fs::symlink_metadata(target) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() >= archived_secs)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::pattern::Filter;
    use crate::archive::writer::ArchiveWriter;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn archived_project() -> (TempDir, TempDir, std::path::PathBuf) {
        let project = TempDir::new().unwrap();
        fs::create_dir_all(project.path().join("src")).unwrap();
        fs::create_dir_all(project.path().join("docs")).unwrap();
        fs::write(project.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(project.path().join("docs/guide.md"), "# Guide").unwrap();
        fs::write(project.path().join("README.md"), "readme").unwrap();

        let out = TempDir::new().unwrap();
        let archive = out.path().join("snap.tar.gz");
        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        ArchiveWriter::new(filter)
            .create(project.path(), &archive, |_| {})
            .unwrap();
        (project, out, archive)
    }

    #[test]
    fn test_extract_all() {
        let (_project, _out, archive) = archived_project();
        let target = TempDir::new().unwrap();

        let summary = extract(&archive, target.path(), None, ExtractMode::All).unwrap();
        assert_eq!(summary.extracted, 5);
        assert_eq!(
            fs::read_to_string(target.path().join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
    }

    #[test]
    fn test_extract_selection_subtree() {
        let (_project, _out, archive) = archived_project();
        let target = TempDir::new().unwrap();

        let selection = Selection::new(["src/"]);
        extract(&archive, target.path(), Some(&selection), ExtractMode::All).unwrap();

        assert!(target.path().join("src/main.rs").exists());
        assert!(!target.path().join("docs").exists());
        assert!(!target.path().join("README.md").exists());
    }

    #[test]
    fn test_newer_only_keeps_newer_live_file() {
        let (project, _out, archive) = archived_project();

        let readme = project.path().join("README.md");
        fs::write(&readme, "edited").unwrap();
        let later = SystemTime::now() + Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&readme)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let guide = project.path().join("docs/guide.md");
        fs::write(&guide, "stale").unwrap();
        File::options()
            .write(true)
            .open(&guide)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();

        let summary = extract(&archive, project.path(), None, ExtractMode::NewerOnly).unwrap();
        assert!(summary.skipped >= 1);
        assert_eq!(fs::read_to_string(&readme).unwrap(), "edited");
        assert_eq!(fs::read_to_string(&guide).unwrap(), "# Guide");
    }

    #[test]
    fn test_selection_contains() {
        let selection = Selection::new(["src/", "README.md"]);
        assert!(selection.contains("src/"));
        assert!(selection.contains("src/deep/file.rs"));
        assert!(selection.contains("README.md"));
        assert!(!selection.contains("srcfile"));
        assert!(!selection.contains("docs/README.md"));
        assert!(Selection::new(Vec::<String>::new()).is_empty());
    }
}
