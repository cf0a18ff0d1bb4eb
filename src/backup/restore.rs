//! Restore results
//!
//! Restoring a unit is best-effort: every tracked path is attempted and its
//! outcome recorded, so one broken entry never hides the others.

use std::path::PathBuf;

use crate::error::BackupError;

/// What happened to one tracked path during restore
#[derive(Debug)]
pub enum RestoreAction {
    /// Original bytes were copied back over the target
    Restored,
    /// Tombstone: the target was created after tracking and has been removed
    Deleted,
    /// Tombstone: the target was already absent
    AlreadyAbsent,
    /// The path could not be restored
    Failed(BackupError),
}

/// Outcome for a single tracked path
#[derive(Debug)]
pub struct RestoreOutcome {
    /// Path relative to the reference directory
    pub path: PathBuf,
    /// What restore did with it
    pub action: RestoreAction,
}

/// Result of restoring a backup unit
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Name of the unit that was restored
    pub unit_name: String,
    /// One outcome per tracked path, in manifest order
    pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
    /// Create an empty report for a unit
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, path: PathBuf, action: RestoreAction) {
        self.outcomes.push(RestoreOutcome { path, action });
    }

    /// Number of files whose original bytes were written back
    pub fn restored_count(&self) -> usize {
        self.count(|a| matches!(a, RestoreAction::Restored))
    }

    /// Number of files removed because they did not exist before tracking
    pub fn deleted_count(&self) -> usize {
        self.count(|a| matches!(a, RestoreAction::Deleted))
    }

    /// Number of tombstones whose target was already gone
    pub fn unchanged_count(&self) -> usize {
        self.count(|a| matches!(a, RestoreAction::AlreadyAbsent))
    }

    fn count(&self, pred: impl Fn(&RestoreAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }

    /// Paths that could not be restored, with the reason
    pub fn failures(&self) -> Vec<(&PathBuf, &BackupError)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.action {
                RestoreAction::Failed(err) => Some((&o.path, err)),
                _ => None,
            })
            .collect()
    }

    /// Check if every tracked path was handled without error
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    /// Get a one-line summary of the restore
    pub fn summary(&self) -> String {
        let failed = self.failures().len();
        let mut summary = format!(
            "Restored {} file(s), deleted {}, unchanged {}",
            self.restored_count(),
            self.deleted_count(),
            self.unchanged_count()
        );
        if failed > 0 {
            summary.push_str(&format!(", {} failed", failed));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RestoreReport {
        let mut report = RestoreReport::new("u1");
        report.record(PathBuf::from("a.txt"), RestoreAction::Restored);
        report.record(PathBuf::from("b.txt"), RestoreAction::Deleted);
        report.record(PathBuf::from("c.txt"), RestoreAction::AlreadyAbsent);
        report
    }

    #[test]
    fn test_counts_and_summary() {
        let report = sample_report();

        assert_eq!(report.restored_count(), 1);
        assert_eq!(report.deleted_count(), 1);
        assert_eq!(report.unchanged_count(), 1);
        assert!(report.is_complete());
        assert_eq!(
            report.summary(),
            "Restored 1 file(s), deleted 1, unchanged 1"
        );
    }

    #[test]
    fn test_failures_are_reported() {
        let mut report = sample_report();
        report.record(
            PathBuf::from("d.txt"),
            RestoreAction::Failed(BackupError::MissingBackupData {
                path: PathBuf::from("d.txt"),
            }),
        );

        assert!(!report.is_complete());
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, &PathBuf::from("d.txt"));
        assert!(report.summary().ends_with("1 failed"));
    }
}
