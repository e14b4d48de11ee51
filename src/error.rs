//! Custom error types for stash
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for stash operations
#[derive(Error, Debug)]
pub enum StashError {
    /// Bad or missing CLI/config input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The archive could not be opened, decoded or listed
    #[error("Failed to read archive {}: {message}", path.display())]
    ArchiveRead { path: PathBuf, message: String },

    /// The archive could not be written
    #[error("Failed to write archive {}: {message}", path.display())]
    ArchiveWrite { path: PathBuf, message: String },

    /// Traversal or deletion failures in the project tree
    #[error("Filesystem error at {}: {message}", path.display())]
    Filesystem { path: PathBuf, message: String },

    /// A loaded options document does not have the expected key set
    #[error(
        "Options file {} does not match the expected schema (missing: [{}], unexpected: [{}])",
        path.display(),
        missing.join(", "),
        unexpected.join(", ")
    )]
    ConfigSchema {
        path: PathBuf,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Invalid glob pattern
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Interactive prompt failures
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl StashError {
    /// Create a filesystem error for a path
    pub fn filesystem(path: impl AsRef<Path>, err: impl ToString) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create an archive read error for a path
    pub fn archive_read(path: impl AsRef<Path>, err: impl ToString) -> Self {
        Self::ArchiveRead {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create an archive write error for a path
    pub fn archive_write(path: impl AsRef<Path>, err: impl ToString) -> Self {
        Self::ArchiveWrite {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create a "not found" error for an options file
    pub fn options_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Options file",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a schema mismatch on load
    pub fn is_config_schema(&self) -> bool {
        matches!(self, Self::ConfigSchema { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for StashError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StashError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<dialoguer::Error> for StashError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}

/// Result type alias for stash operations
pub type StashResult<T> = Result<T, StashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StashError::Validation("Please define an output file path!".into());
        assert_eq!(
            err.to_string(),
            "Validation error: Please define an output file path!"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_not_found_error() {
        let err = StashError::options_not_found("stash.json");
        assert_eq!(err.to_string(), "Options file not found: stash.json");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_schema_error_names_keys() {
        let err = StashError::ConfigSchema {
            path: PathBuf::from("stash.json"),
            missing: vec!["prompt".into()],
            unexpected: vec!["globs".into(), "level".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("stash.json"));
        assert!(msg.contains("missing: [prompt]"));
        assert!(msg.contains("unexpected: [globs, level]"));
        assert!(err.is_config_schema());
    }

    #[test]
    fn test_filesystem_error_names_path() {
        let err = StashError::filesystem("src/lib.rs", "permission denied");
        assert_eq!(
            err.to_string(),
            "Filesystem error at src/lib.rs: permission denied"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let stash_err: StashError = io_err.into();
        assert!(matches!(stash_err, StashError::Io(_)));
    }
}
