//! Custom error types for backup-unit
//!
//! This module defines the error hierarchy for backup units using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for backup unit operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem-level failure (copy, create, delete)
    #[error("I/O error: {0}")]
    Io(String),

    /// A tracked path has no shadow file at restore time
    #[error("Backup data missing for {}", path.display())]
    MissingBackupData { path: PathBuf },

    /// Manifest content could not be interpreted
    #[error("Manifest {} is corrupt: {reason}", manifest.display())]
    ManifestCorrupt { manifest: PathBuf, reason: String },

    /// A file cannot be expressed relative to the reference directory
    #[error(
        "{} is not inside the reference directory {}",
        path.display(),
        reference.display()
    )]
    OutsideReference { path: PathBuf, reference: PathBuf },

    /// A restore left one or more paths unrestored
    #[error("Restore of {unit} incomplete: {failed} path(s) could not be restored")]
    RestoreIncomplete { unit: String, failed: usize },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl BackupError {
    /// Create a "not found" error for backup units
    pub fn unit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup unit",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a missing shadow file error
    pub fn is_missing_backup_data(&self) -> bool {
        matches!(self, Self::MissingBackupData { .. })
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for backup unit operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = BackupError::unit_not_found("2024-01-05_3-04-05");
        assert_eq!(
            err.to_string(),
            "Backup unit not found: 2024-01-05_3-04-05"
        );
        assert!(err.is_not_found());
        assert!(!err.is_missing_backup_data());
    }

    #[test]
    fn test_missing_backup_data_error() {
        let err = BackupError::MissingBackupData {
            path: PathBuf::from("Plugins/mod.dll"),
        };
        assert_eq!(err.to_string(), "Backup data missing for Plugins/mod.dll");
        assert!(err.is_missing_backup_data());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let backup_err: BackupError = io_err.into();
        assert!(matches!(backup_err, BackupError::Io(_)));
    }
}
