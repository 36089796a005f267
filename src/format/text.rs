//! Plain text rendering for terminal output.

use crate::model::{FieldBinding, RunReport};
use crate::util::time::format_elapsed;
use std::fmt::Write;
use std::time::Duration;

/// Maximum number of skipped/failed records listed in the text report.
const MAX_LISTED_ISSUES: usize = 50;

/// Render a phase summary followed by its skipped and failed records.
#[must_use]
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    let title = if report.dry_run {
        format!("{} (dry run)", report.phase)
    } else {
        report.phase.to_string()
    };

    let _ = writeln!(out, "== {title} ==");
    let _ = writeln!(out, "  attempted: {}", report.attempted);
    let _ = writeln!(out, "  {}: {}", report.phase.success_label(), report.succeeded);
    let _ = writeln!(out, "  skipped: {}", report.skipped);
    let _ = writeln!(out, "  failed: {}", report.failed);
    let _ = writeln!(
        out,
        "  elapsed: {}",
        format_elapsed(Duration::from_secs_f64(report.elapsed_secs.max(0.0)))
    );
    if let Some(path) = &report.checkpoint {
        let _ = writeln!(out, "  checkpoint: {path}");
    }

    if !report.issues.is_empty() {
        let _ = writeln!(out);
        for issue in report.issues.iter().take(MAX_LISTED_ISSUES) {
            let retry = if issue.retryable { " (retryable)" } else { "" };
            let _ = writeln!(
                out,
                "  {:<8} {:<14} {}{}: {}",
                issue.status, issue.issue_key, issue.kind, retry, issue.message
            );
        }
        if report.issues.len() > MAX_LISTED_ISSUES {
            let _ = writeln!(
                out,
                "  ... and {} more (use --json for the full list)",
                report.issues.len() - MAX_LISTED_ISSUES
            );
        }
    }

    out
}

/// Render the field catalog as an aligned two-column table.
#[must_use]
pub fn format_field_table(fields: &[FieldBinding]) -> String {
    let width = fields
        .iter()
        .map(|field| field.field_id.len())
        .max()
        .unwrap_or(2)
        .max(2);
    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  NAME", "ID");
    for field in fields {
        let _ = writeln!(
            out,
            "{:<width$}  {}",
            field.field_id, field.field_display_name
        );
    }
    out
}
