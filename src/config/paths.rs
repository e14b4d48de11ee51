//! Path management for stash
//!
//! Resolves the project root, the archive directory and the default options
//! file.
//!
//! ## Project Root Resolution Order
//!
//! 1. `STASH_PROJECT_DIR` environment variable (if set)
//! 2. The current working directory

use std::path::{Path, PathBuf};

use crate::error::StashError;

/// Name of the options file saved in the project root by default
pub const DEFAULT_OPTIONS_FILE: &str = "stash.json";

/// Manages all paths used by stash
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Directory being archived and restored
    root: PathBuf,
}

impl ProjectPaths {
    /// Create a new ProjectPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new() -> Result<Self, StashError> {
        let root = if let Ok(custom) = std::env::var("STASH_PROJECT_DIR") {
            PathBuf::from(custom)
        } else {
            std::env::current_dir().map_err(|e| {
                StashError::Config(format!("Could not determine current directory: {}", e))
            })?
        };

        Ok(Self { root })
    }

    /// Create ProjectPaths with a custom root (useful for testing)
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base name of the project root, used for `<cwd>`
    pub fn cwd_name(&self) -> String {
        let absolute = std::path::absolute(&self.root).unwrap_or_else(|_| self.root.clone());
        absolute
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Resolve a possibly relative path against the project root
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Directory scanned for existing archives
    pub fn archive_dir(&self, archive_directory: &str) -> PathBuf {
        self.resolve(archive_directory)
    }

    /// Default location of the options file
    pub fn default_options_file(&self) -> PathBuf {
        self.root.join(DEFAULT_OPTIONS_FILE)
    }

    /// Path of `target` relative to the project root, if it lives inside it
    ///
    /// Used to keep the archive being restored out of the deletion set.
    pub fn relative_inside(&self, target: &Path) -> Option<String> {
        let root = self.root.canonicalize().ok()?;
        let target = target.canonicalize().ok()?;
        let relative = target.strip_prefix(&root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }
}
