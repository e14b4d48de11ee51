//! Configuration module for stash
//!
//! This module provides configuration management including:
//! - Project root and archive directory resolution
//! - The persisted options document

pub mod options;
pub mod paths;

pub use options::{ListEdit, OptionField, OptionValue, Options, ValueKind};
pub use paths::ProjectPaths;
