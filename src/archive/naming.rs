//! Output file naming
//!
//! Expands the output template placeholders and appends the comment suffix
//! and archive extension.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};

use crate::error::{StashError, StashResult};

/// Extension appended to every archive written by stash
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Format `now` with a strftime string, rejecting invalid specifiers
pub fn format_timestamp<Tz>(now: &DateTime<Tz>, format: &str) -> StashResult<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(StashError::Validation(format!(
            "Invalid timestamp format '{}'",
            format
        )));
    }
    Ok(now.format(format).to_string())
}

/// Expand `<cwd>`, `<timestamp>` and `<version>` in the template
///
/// Every occurrence is substituted. The result has no extension.
pub fn render_template(template: &str, cwd_name: &str, timestamp: &str) -> String {
    template
        .replace("<cwd>", cwd_name)
        .replace("<timestamp>", timestamp)
        .replace("<version>", env!("CARGO_PKG_VERSION"))
}

/// Full output file name: template, optional ` - comment`, extension
pub fn render_output_name(
    template: &str,
    cwd_name: &str,
    timestamp: &str,
    comment: Option<&str>,
) -> String {
    let mut name = render_template(template, cwd_name, timestamp);
    if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
        name.push_str(" - ");
        name.push_str(comment);
    }
    name.push_str(ARCHIVE_EXTENSION);
    name
}
