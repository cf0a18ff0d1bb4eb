//! Backup store
//!
//! Enumerates and opens the backup units kept under one base directory.
//! The store never prunes: deleting a unit is always an explicit call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;
use tracing::{debug, info, warn};

use super::manifest::MANIFEST_FILE_NAME;
use super::restore::RestoreReport;
use super::unit::{unit_name_for, BackupUnit};
use crate::error::{BackupError, BackupResult};

/// Metadata about a backup unit on disk
#[derive(Debug, Clone)]
pub struct UnitInfo {
    /// Unit name (directory name)
    pub name: String,
    /// Full path to the unit directory
    pub path: PathBuf,
    /// Number of tracked paths
    pub tracked_count: usize,
    /// Whether the unit predates manifests
    pub legacy: bool,
    /// Last modification time of the unit directory
    pub modified: Option<SystemTime>,
}

/// Manages the units stored under one backup directory
pub struct BackupStore {
    /// Directory holding one sub-directory per unit
    backup_dir: PathBuf,
    /// Directory tracked paths are relative to
    reference_dir: PathBuf,
}

impl BackupStore {
    /// Create a new BackupStore
    pub fn new(backup_dir: impl Into<PathBuf>, reference_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            reference_dir: reference_dir.into(),
        }
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get reference directory path
    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    /// Create the backup directory if it does not exist yet
    pub fn ensure_exists(&self) -> BackupResult<()> {
        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            BackupError::Io(format!("Failed to create backup directory: {}", e))
        })
    }

    /// Start a fresh unit named after the current time
    ///
    /// The unit directory is created here to reserve the name. When a unit
    /// with the same timestamp already exists a `-N` suffix is appended.
    pub fn create_unit(&self) -> BackupResult<BackupUnit> {
        self.ensure_exists()?;

        let stamp = unit_name_for(Local::now());
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                stamp.clone()
            } else {
                format!("{}-{}", stamp, attempt)
            };

            match fs::create_dir(self.backup_dir.join(&name)) {
                Ok(()) => {
                    debug!(unit = %name, "reserved backup unit");
                    return Ok(BackupUnit::with_name(
                        &self.backup_dir,
                        name,
                        &self.reference_dir,
                    ));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(BackupError::Io(format!(
                        "Failed to create backup unit {}: {}",
                        name, e
                    )));
                }
            }
        }
    }

    /// Open the named unit, or start a fresh one with that name
    pub fn open_or_create(&self, name: &str) -> BackupResult<BackupUnit> {
        self.ensure_exists()?;
        match self.open_unit(name) {
            Err(err) if err.is_not_found() => Ok(BackupUnit::with_name(
                &self.backup_dir,
                name,
                &self.reference_dir,
            )),
            other => other,
        }
    }

    /// Reconstruct an existing unit by name
    pub fn open_unit(&self, name: &str) -> BackupResult<BackupUnit> {
        let path = self.backup_dir.join(name);
        if !is_plain_name(name) || !path.is_dir() {
            return Err(BackupError::unit_not_found(name));
        }
        BackupUnit::from_directory(&path, &self.backup_dir, &self.reference_dir)
    }

    /// List all units, newest first
    pub fn list_units(&self) -> BackupResult<Vec<UnitInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut units = Vec::new();

        for entry in fs::read_dir(&self.backup_dir).map_err(|e| {
            BackupError::Io(format!("Failed to read backup directory: {}", e))
        })? {
            let entry = entry.map_err(|e| {
                BackupError::Io(format!("Failed to read directory entry: {}", e))
            })?;

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            match BackupUnit::from_directory(&path, &self.backup_dir, &self.reference_dir) {
                Ok(unit) => units.push(UnitInfo {
                    name: unit.name().to_string(),
                    tracked_count: unit.len(),
                    legacy: !unit.has_manifest(),
                    modified: fs::metadata(&path).and_then(|m| m.modified()).ok(),
                    path,
                }),
                Err(err) => warn!(path = %path.display(), "skipping unreadable unit: {}", err),
            }
        }

        // Newest first; names break ties so the order is stable
        units.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));

        Ok(units)
    }

    /// Reconstruct the most recent unit, if any
    pub fn latest_unit(&self) -> BackupResult<Option<BackupUnit>> {
        match self.list_units()?.into_iter().next() {
            Some(info) => self.open_unit(&info.name).map(Some),
            None => Ok(None),
        }
    }

    /// Check if at least one unit exists
    pub fn has_backup(&self) -> BackupResult<bool> {
        Ok(!self.list_units()?.is_empty())
    }

    /// Roll back the most recent unit
    ///
    /// The unit is deleted afterwards only when every path was restored, so a
    /// partially failed rollback can be retried.
    pub fn restore_latest(&self) -> BackupResult<Option<RestoreReport>> {
        let Some(unit) = self.latest_unit()? else {
            debug!(dir = %self.backup_dir.display(), "no backup to restore");
            return Ok(None);
        };

        let report = unit.restore();
        if report.is_complete() {
            unit.delete()?;
        } else {
            info!(unit = %unit.name(), "keeping unit after incomplete restore");
        }

        Ok(Some(report))
    }
}

/// A unit name must be a single path component other than the manifest
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && name != MANIFEST_FILE_NAME
}
