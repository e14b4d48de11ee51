//! Restore and extract operations
//!
//! Every operation runs the same linear sequence of stages and stops at the
//! first failure: listing the archive, reconciling it with the live tree,
//! deleting extra live paths, then extracting. Deletion always finishes
//! before extraction starts.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use super::reconcile::{diff, retain_deletable, scoped_diff};
use crate::archive::extract::{extract, ExtractMode, Selection};
use crate::archive::index::list_entries;
use crate::archive::lister::{is_dir_entry, list_all};
use crate::archive::pattern::{has_dot_component, PatternSet};
use crate::config::{Options, ProjectPaths};
use crate::error::{StashError, StashResult};

/// Stage of a restore operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Reconciling,
    Deleting,
    Extracting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Listing => "listing",
            Stage::Reconciling => "reconciling",
            Stage::Deleting => "deleting",
            Stage::Extracting => "extracting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a restore or extract operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Live paths removed before extraction, in deletion order
    pub deleted: Vec<String>,
    /// Entries written from the archive
    pub extracted: usize,
    /// Entries left alone (newer live copies)
    pub skipped: usize,
}

/// Runs extract/restore operations against one project root
pub struct RestoreExecutor {
    paths: ProjectPaths,
    exclude: PatternSet,
    match_dotfiles: bool,
}

impl RestoreExecutor {
    /// Create an executor; `exclude` scopes which live paths may be deleted
    ///
    /// Paths with a dot component are never deleted unless
    /// [`with_dotfiles`](Self::with_dotfiles) enables them, matching archives
    /// created without `--dot`.
    pub fn new(paths: ProjectPaths, exclude: PatternSet) -> Self {
        Self {
            paths,
            exclude,
            match_dotfiles: false,
        }
    }

    /// Create an executor using the exclude patterns of `options`
    pub fn from_options(paths: ProjectPaths, options: &Options) -> StashResult<Self> {
        let exclude = PatternSet::new(&options.exclude, true)?;
        Ok(Self::new(paths, exclude))
    }

    /// Treat dotfiles like any other path (archives created with `--dot`)
    pub fn with_dotfiles(mut self, match_dotfiles: bool) -> Self {
        self.match_dotfiles = match_dotfiles;
        self
    }

    fn root(&self) -> &Path {
        self.paths.root()
    }

    /// Whether a live path may be deleted when it is missing from the archive
    fn is_deletable(&self, path: &str) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        self.match_dotfiles || !has_dot_component(path)
    }

    /// Extract every entry into the project root
    pub fn extract(&self, archive: &Path, mode: ExtractMode) -> StashResult<RestoreReport> {
        stage("extract", Stage::Extracting);
        let summary = extract(archive, self.root(), None, mode)?;
        stage("extract", Stage::Done);

        Ok(RestoreReport {
            deleted: Vec::new(),
            extracted: summary.extracted,
            skipped: summary.skipped,
        })
    }

    /// Extract only the selected entries
    ///
    /// Fails without touching the disk if the selection is empty or names a
    /// path that is not in the archive.
    pub fn extract_some(
        &self,
        archive: &Path,
        selection: &[String],
        mode: ExtractMode,
    ) -> StashResult<RestoreReport> {
        stage("extract-some", Stage::Listing);
        let entries = entry_set(archive)?;
        check_selection(selection, &entries)?;

        stage("extract-some", Stage::Extracting);
        let selected = Selection::new(selection.iter().cloned());
        let summary = extract(archive, self.root(), Some(&selected), mode)?;
        stage("extract-some", Stage::Done);

        Ok(RestoreReport {
            deleted: Vec::new(),
            extracted: summary.extracted,
            skipped: summary.skipped,
        })
    }

    /// Live paths a full restore would delete
    pub fn plan_restore(&self, archive: &Path) -> StashResult<Vec<String>> {
        stage("restore", Stage::Listing);
        let entries = entry_set(archive)?;

        stage("restore", Stage::Reconciling);
        let live_all = list_all(self.root())?;
        let live: Vec<String> = live_all
            .iter()
            .filter(|path| self.is_deletable(path))
            .cloned()
            .collect();

        let candidates = diff(&live, &entries);
        Ok(retain_deletable(
            candidates,
            &live_all,
            &self.protected(archive),
        ))
    }

    /// Live paths a restore of `selection` would delete
    pub fn plan_restore_some(&self, archive: &Path, selection: &[String]) -> StashResult<Vec<String>> {
        stage("restore-some", Stage::Listing);
        let entries = entry_set(archive)?;
        check_selection(selection, &entries)?;

        stage("restore-some", Stage::Reconciling);
        let candidates = scoped_diff(self.root(), selection, &entries, |path| {
            self.is_deletable(path)
        })?;
        let live_all = list_all(self.root())?;
        Ok(retain_deletable(
            candidates,
            &live_all,
            &self.protected(archive),
        ))
    }

    /// Delete everything not in the archive (excluded paths aside), then extract
    pub fn restore(&self, archive: &Path, mode: ExtractMode) -> StashResult<RestoreReport> {
        let plan = self.plan_restore(archive)?;

        stage("restore", Stage::Deleting);
        let deleted = delete_paths(self.root(), &plan)?;

        stage("restore", Stage::Extracting);
        let summary = extract(archive, self.root(), None, mode)?;
        stage("restore", Stage::Done);

        Ok(RestoreReport {
            deleted,
            extracted: summary.extracted,
            skipped: summary.skipped,
        })
    }

    /// Restore only the selected paths
    ///
    /// Deletion is scoped to the selected directories; nothing outside them
    /// is touched.
    pub fn restore_some(
        &self,
        archive: &Path,
        selection: &[String],
        mode: ExtractMode,
    ) -> StashResult<RestoreReport> {
        let plan = self.plan_restore_some(archive, selection)?;

        stage("restore-some", Stage::Deleting);
        let deleted = delete_paths(self.root(), &plan)?;

        stage("restore-some", Stage::Extracting);
        let selected = Selection::new(selection.iter().cloned());
        let summary = extract(archive, self.root(), Some(&selected), mode)?;
        stage("restore-some", Stage::Done);

        Ok(RestoreReport {
            deleted,
            extracted: summary.extracted,
            skipped: summary.skipped,
        })
    }

    /// Remove an archive file; `false` if it was already gone
    pub fn delete_archive(archive: &Path) -> StashResult<bool> {
        match fs::remove_file(archive) {
            Ok(()) => {
                info!("Deleted archive {}", archive.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StashError::filesystem(archive, e)),
        }
    }

    /// Paths inside the project that a restore must never delete
    fn protected(&self, archive: &Path) -> Vec<String> {
        let options_file = self.paths.default_options_file();
        [archive, options_file.as_path()]
            .into_iter()
            .filter_map(|path| self.paths.relative_inside(path))
            .collect()
    }
}

fn stage(operation: &str, stage: Stage) {
    debug!("{}: {}", operation, stage);
}

fn entry_set(archive: &Path) -> StashResult<HashSet<String>> {
    Ok(list_entries(archive)?.into_iter().collect())
}

fn check_selection(selection: &[String], entries: &HashSet<String>) -> StashResult<()> {
    if selection.is_empty() {
        return Err(StashError::Validation("Nothing selected".into()));
    }

    let unknown: Vec<&str> = selection
        .iter()
        .filter(|path| !entries.contains(path.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(StashError::Validation(format!(
            "Not in archive: {}",
            unknown.join(", ")
        )));
    }
    Ok(())
}

/// Delete File Entries under `root` in the given order
///
/// Directories are removed with `remove_dir`, so a non-empty directory is an
/// error rather than a recursive delete. Paths that already vanished are
/// skipped.
fn delete_paths(root: &Path, paths: &[String]) -> StashResult<Vec<String>> {
    let mut deleted = Vec::new();

    for entry in paths {
        let target = root.join(entry.trim_end_matches('/'));

        let metadata = match fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Already gone: {}", entry);
                continue;
            }
            Err(e) => return Err(StashError::filesystem(&target, e)),
        };

        let result = if metadata.is_dir() && is_dir_entry(entry) {
            fs::remove_dir(&target)
        } else {
            fs::remove_file(&target)
        };

        match result {
            Ok(()) => {
                info!("Deleted {}", entry);
                deleted.push(entry.clone());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Already gone: {}", entry);
            }
            Err(e) => return Err(StashError::filesystem(&target, e)),
        }
    }

    Ok(deleted)
}
