//! Archive display formatting
//!
//! Formats archive summaries and archive picker labels for terminal output.

use chrono::{DateTime, Local};

use crate::archive::{ArchiveInfo, WriteSummary};

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// "1 file", "2 files"
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// "Archived 3 files and 1 directory"
pub fn format_counts(summary: &WriteSummary) -> String {
    format!(
        "Archived {} and {}",
        plural(summary.file_count, "file", "files"),
        plural(summary.directory_count, "directory", "directories")
    )
}

/// "Wrote 1.2 KB in 35ms"
pub fn format_written(summary: &WriteSummary, elapsed: std::time::Duration) -> String {
    format!(
        "Wrote {} in {}ms",
        format_size(summary.total_bytes),
        elapsed.as_millis()
    )
}

/// One-line label used in archive pickers
pub fn archive_label(archive: &ArchiveInfo, now: DateTime<Local>) -> String {
    format!(
        "{} ({}, {} ago)",
        archive.display_name(),
        format_size(archive.size_bytes),
        format_duration(now - archive.modified)
    )
}
