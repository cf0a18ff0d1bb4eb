//! Backup unit
//!
//! A unit is a named snapshot of the pre-change state of a set of files,
//! stored as a shadow tree under `<backup_dir>/<name>` plus a manifest.
//! A zero-length shadow file is a tombstone: the path did not exist when it
//! was tracked, so restoring means deleting it.
//!
//! Restore has no journal. If the process dies mid-restore some paths are
//! back to their tracked state and others are not; running restore again
//! finishes the job because each path is restored independently.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use super::manifest::{self, MANIFEST_FILE_NAME};
use super::restore::{RestoreAction, RestoreReport};
use crate::error::{BackupError, BackupResult};

/// Format of generated unit names (`YYYY-MM-DD_h-mm-ss`, 12-hour clock)
pub const UNIT_NAME_FORMAT: &str = "%Y-%m-%d_%-I-%M-%S";

/// State of the shadow file backing one tracked path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowKind {
    /// Copy of the original bytes
    Snapshot { size: u64 },
    /// The path did not exist when tracked
    Tombstone,
    /// Shadow file is gone (tampering or corruption)
    Missing,
}

/// A tracked path together with the state of its shadow file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowEntry {
    pub path: PathBuf,
    pub kind: ShadowKind,
}

/// A named, self-contained snapshot of pre-change file states
///
/// A unit is not synchronized internally; confine each unit to one thread.
/// Distinct units own disjoint directories and may be used concurrently.
#[derive(Debug)]
pub struct BackupUnit {
    name: String,
    root_path: PathBuf,
    manifest_path: PathBuf,
    reference_dir: PathBuf,
    tracked: Vec<PathBuf>,
}

/// Generate a unit name from a timestamp
pub fn unit_name_for(time: DateTime<Local>) -> String {
    time.format(UNIT_NAME_FORMAT).to_string()
}

impl BackupUnit {
    /// Create a fresh unit named after the current local time
    ///
    /// Nothing is written to disk until the first [`BackupUnit::add`].
    pub fn new(backup_dir: impl AsRef<Path>, reference_dir: impl Into<PathBuf>) -> Self {
        Self::with_name(backup_dir, unit_name_for(Local::now()), reference_dir)
    }

    /// Create a fresh unit with an explicit name
    pub fn with_name(
        backup_dir: impl AsRef<Path>,
        name: impl Into<String>,
        reference_dir: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        let root_path = backup_dir.as_ref().join(&name);
        let manifest_path = root_path.join(MANIFEST_FILE_NAME);

        Self {
            name,
            root_path,
            manifest_path,
            reference_dir: reference_dir.into(),
            tracked: Vec::new(),
        }
    }

    /// Reconstruct a unit from its existing directory
    ///
    /// The directory name becomes the unit name. Tracked paths come from the
    /// manifest when present; units written before manifests existed are
    /// inferred from the files found under the directory.
    pub fn from_directory(
        directory: &Path,
        backup_dir: impl AsRef<Path>,
        reference_dir: impl Into<PathBuf>,
    ) -> BackupResult<Self> {
        let name = directory
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BackupError::unit_not_found(directory.display().to_string()))?;

        let mut unit = Self::with_name(backup_dir, name, reference_dir);

        if !unit.root_path.is_dir() {
            return Err(BackupError::unit_not_found(&unit.name));
        }

        unit.tracked = if unit.manifest_path.is_file() {
            manifest::read(&unit.manifest_path)?
        } else {
            debug!(unit = %unit.name, "no manifest, scanning legacy backup");
            manifest::scan_legacy(&unit.root_path)?
        };

        debug!(unit = %unit.name, tracked = unit.tracked.len(), "reconstructed backup unit");
        Ok(unit)
    }

    /// Unit name (also the directory name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory owned by this unit
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Location of the manifest file
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory tracked paths are relative to
    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    /// Tracked relative paths in the order they were added
    pub fn tracked_paths(&self) -> &[PathBuf] {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path.is_file()
    }

    /// Check whether a file is already tracked by this unit
    pub fn is_tracked(&self, file: impl AsRef<Path>) -> bool {
        manifest::relative_to(&self.reference_dir, file.as_ref())
            .map(|rel| self.tracked.contains(&rel))
            .unwrap_or(false)
    }

    /// Record the current state of `file` before it is modified or deleted
    ///
    /// Must succeed before the caller touches the file. Tracking a path a
    /// second time is a no-op, so the first snapshot always survives.
    pub fn add(&mut self, file: impl AsRef<Path>) -> BackupResult<()> {
        let relative = manifest::relative_to(&self.reference_dir, file.as_ref())?;

        if self.tracked.contains(&relative) {
            debug!(unit = %self.name, path = %relative.display(), "already tracked, skipping");
            return Ok(());
        }

        // Validate the manifest line before anything is written
        manifest::to_line(&self.manifest_path, &relative)?;

        let source = self.reference_dir.join(&relative);
        let shadow = self.root_path.join(&relative);
        debug!(
            unit = %self.name,
            source = %source.display(),
            shadow = %shadow.display(),
            "tracking file"
        );

        if let Some(parent) = shadow.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BackupError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        match fs::metadata(&source) {
            Ok(meta) if meta.is_file() => {
                fs::copy(&source, &shadow).map_err(|e| {
                    BackupError::Io(format!(
                        "Failed to copy {} to {}: {}",
                        source.display(),
                        shadow.display(),
                        e
                    ))
                })?;
            }
            Ok(_) => {
                return Err(BackupError::Io(format!(
                    "Cannot back up {}: not a regular file",
                    source.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                File::create(&shadow).map_err(|e| {
                    BackupError::Io(format!(
                        "Failed to create tombstone {}: {}",
                        shadow.display(),
                        e
                    ))
                })?;
            }
            Err(e) => {
                return Err(BackupError::Io(format!(
                    "Failed to inspect {}: {}",
                    source.display(),
                    e
                )));
            }
        }

        manifest::append(&self.manifest_path, &relative)?;
        self.tracked.push(relative);

        Ok(())
    }

    /// Track several files, stopping at the first failure
    pub fn add_all<I, P>(&mut self, files: I) -> BackupResult<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for file in files {
            self.add(file)?;
        }
        Ok(())
    }

    /// Put every tracked path back into its recorded state
    ///
    /// Best-effort: a failure on one path is recorded in the report and the
    /// remaining paths are still attempted.
    pub fn restore(&self) -> RestoreReport {
        let mut report = RestoreReport::new(&self.name);

        for relative in &self.tracked {
            debug!(unit = %self.name, path = %relative.display(), "restoring");
            let action = self.restore_path(relative);
            if let RestoreAction::Failed(err) = &action {
                error!(unit = %self.name, path = %relative.display(), "{}", err);
            }
            report.record(relative.clone(), action);
        }

        info!(unit = %self.name, "{}", report.summary());
        report
    }

    fn restore_path(&self, relative: &Path) -> RestoreAction {
        let shadow = self.root_path.join(relative);
        let target = self.reference_dir.join(relative);

        let meta = match fs::metadata(&shadow) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return RestoreAction::Failed(BackupError::MissingBackupData {
                    path: relative.to_path_buf(),
                });
            }
            Err(e) => {
                return RestoreAction::Failed(BackupError::Io(format!(
                    "Failed to inspect {}: {}",
                    shadow.display(),
                    e
                )));
            }
        };

        if meta.len() > 0 {
            debug!(from = %shadow.display(), to = %target.display(), "copying back");
            match copy_back(&shadow, &target) {
                Ok(()) => RestoreAction::Restored,
                Err(err) => RestoreAction::Failed(err),
            }
        } else {
            debug!(target = %target.display(), "tombstone, removing target");
            match fs::remove_file(&target) {
                Ok(()) => RestoreAction::Deleted,
                Err(e) if e.kind() == ErrorKind::NotFound => RestoreAction::AlreadyAbsent,
                Err(e) => RestoreAction::Failed(BackupError::Io(format!(
                    "Failed to delete {}: {}",
                    target.display(),
                    e
                ))),
            }
        }
    }

    /// Describe the shadow file behind every tracked path
    pub fn entries(&self) -> Vec<ShadowEntry> {
        self.tracked
            .iter()
            .map(|relative| {
                let kind = match fs::metadata(self.root_path.join(relative)) {
                    Ok(meta) if meta.len() > 0 => ShadowKind::Snapshot { size: meta.len() },
                    Ok(_) => ShadowKind::Tombstone,
                    Err(_) => ShadowKind::Missing,
                };
                ShadowEntry {
                    path: relative.clone(),
                    kind,
                }
            })
            .collect()
    }

    /// Remove the unit directory and everything in it
    pub fn delete(self) -> BackupResult<()> {
        if !self.root_path.exists() {
            return Ok(());
        }

        fs::remove_dir_all(&self.root_path).map_err(|e| {
            BackupError::Io(format!(
                "Failed to delete backup unit {}: {}",
                self.root_path.display(),
                e
            ))
        })?;

        info!(unit = %self.name, "deleted backup unit");
        Ok(())
    }
}

/// Copy a shadow file over its target, creating parent directories
fn copy_back(shadow: &Path, target: &Path) -> BackupResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BackupError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    fs::copy(shadow, target).map_err(|e| {
        BackupError::Io(format!(
            "Failed to copy {} to {}: {}",
            shadow.display(),
            target.display(),
            e
        ))
    })?;

    Ok(())
}
