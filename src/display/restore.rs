//! Restore display formatting

use crate::restore::RestoreReport;

use super::archive::plural;

/// Format a deletion plan for confirmation
pub fn format_plan(plan: &[String]) -> String {
    if plan.is_empty() {
        return "Nothing to delete.".to_string();
    }

    let mut output = format!("{} will be deleted:\n", plural(plan.len(), "path", "paths"));
    for path in plan {
        output.push_str(&format!("  - {}\n", path));
    }
    output
}

/// Format the outcome of a restore or extract
pub fn format_report(report: &RestoreReport) -> String {
    let mut parts = Vec::new();
    if !report.deleted.is_empty() {
        parts.push(format!(
            "deleted {}",
            plural(report.deleted.len(), "path", "paths")
        ));
    }
    parts.push(format!(
        "extracted {}",
        plural(report.extracted, "entry", "entries")
    ));
    if report.skipped > 0 {
        parts.push(format!("kept {} newer", report.skipped));
    }

    let mut text = parts.join(", ");
    if let Some(first) = text.get(..1) {
        text = first.to_uppercase() + &text[1..];
    }
    text
}
