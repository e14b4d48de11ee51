//! Display formatting for terminal output
//!
//! Provides utilities for formatting archive summaries, archive labels and
//! restore reports for terminal display.

pub mod archive;
pub mod restore;

pub use archive::{archive_label, format_counts, format_duration, format_size, format_written};
pub use restore::{format_plan, format_report};
