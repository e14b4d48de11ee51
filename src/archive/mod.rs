//! Archive creation, inspection and extraction
//!
//! This module provides:
//! - Include/exclude glob matching shared with restore
//! - Sorted project listings
//! - Writing, listing and extracting `.tar.gz` archives
//! - Output file naming and the catalog of existing archives

pub mod catalog;
pub mod extract;
pub mod index;
pub mod lister;
pub mod naming;
pub mod pattern;
pub mod writer;

pub use catalog::{list_archives, ArchiveInfo};
pub use extract::{ExtractMode, ExtractSummary, Selection};
pub use index::list_entries;
pub use pattern::{Filter, PatternSet};
pub use writer::{
    create_archive, resolve_output, ArchiveOutcome, ArchiveRequest, ArchiveWriter, WriteSummary,
};
