//! Display formatting for terminal output
//!
//! Formats backup units and restore reports as plain-text tables.

use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::backup::{RestoreAction, RestoreReport, ShadowEntry, ShadowKind, UnitInfo};

/// Format a list of units as a table
pub fn format_unit_list(units: &[UnitInfo], verbose: bool) -> String {
    if units.is_empty() {
        return "No backup units found.".to_string();
    }

    let name_width = units.iter().map(|u| u.name.len()).max().unwrap_or(4).max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>5}  {:<8}  {}\n",
        "Name",
        "Files",
        "Age",
        "Notes",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->5}  {:-<8}  {:-<6}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for unit in units {
        let notes = if unit.legacy { "legacy" } else { "" };
        output.push_str(&format!(
            "{:<name_width$}  {:>5}  {:<8}  {}\n",
            unit.name,
            unit.tracked_count,
            unit.modified.map(format_age).unwrap_or_else(|| "?".into()),
            notes,
            name_width = name_width,
        ));
        if verbose {
            output.push_str(&format!("    {}\n", unit.path.display()));
        }
    }

    output.push_str(&format!("\nTotal: {} unit(s)", units.len()));
    output
}

/// Format the tracked entries of one unit
pub fn format_unit_entries(name: &str, entries: &[ShadowEntry]) -> String {
    let mut output = format!("Backup unit {}\n", name);
    output.push_str(&"=".repeat(12 + name.len()));
    output.push('\n');

    if entries.is_empty() {
        output.push_str("No tracked files.");
        return output;
    }

    for entry in entries {
        let kind = match entry.kind {
            ShadowKind::Snapshot { size } => format_size(size),
            ShadowKind::Tombstone => "new file (delete on restore)".to_string(),
            ShadowKind::Missing => "MISSING".to_string(),
        };
        output.push_str(&format!("  {}  [{}]\n", entry.path.display(), kind));
    }

    output.push_str(&format!("\nTracked: {} file(s)", entries.len()));
    output
}

/// Format a restore report, one line per path
pub fn format_restore_report(report: &RestoreReport) -> String {
    let mut output = String::new();

    for outcome in &report.outcomes {
        let line = match &outcome.action {
            RestoreAction::Restored => format!("  restored  {}", outcome.path.display()),
            RestoreAction::Deleted => format!("  deleted   {}", outcome.path.display()),
            RestoreAction::AlreadyAbsent => format!("  absent    {}", outcome.path.display()),
            RestoreAction::Failed(err) => {
                format!("  FAILED    {}: {}", outcome.path.display(), err)
            }
        };
        output.push_str(&line);
        output.push('\n');
    }

    output.push_str(&report.summary());
    output
}

/// Format time elapsed since `time` in a compact form
fn format_age(time: SystemTime) -> String {
    let then: DateTime<Local> = time.into();
    let total_seconds = Local::now().signed_duration_since(then).num_seconds().max(0);

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

    format!("{}d", hours / 24)
}

/// Format a file size in human-readable form
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
