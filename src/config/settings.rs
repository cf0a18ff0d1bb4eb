//! User settings for backup-unit
//!
//! Persists where backup units live and which directory tracked paths are
//! relative to.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::BackupPaths;
use crate::error::BackupError;

/// User settings for backup-unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Directory holding one sub-directory per backup unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    /// Directory that tracked paths are recorded relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_dir: Option<PathBuf>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_dir: None,
            reference_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &BackupPaths) -> Result<Self, BackupError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                BackupError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BackupError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BackupPaths) -> Result<(), BackupError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            BackupError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            BackupError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// The effective backup directory: the override if set, else the default
    pub fn resolve_backup_dir(&self, paths: &BackupPaths) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| paths.backup_dir())
    }

    /// The effective reference directory, falling back to `cwd`
    ///
    /// A relative setting is taken relative to `cwd`, so the result is
    /// absolute whenever `cwd` is. The working directory is passed in by the
    /// caller so the library never consults process-global state.
    pub fn resolve_reference_dir(&self, cwd: &Path) -> PathBuf {
        match &self.reference_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.backup_dir.is_none());
        assert!(settings.reference_dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            backup_dir: Some(temp_dir.path().join("elsewhere")),
            reference_dir: Some(PathBuf::from("/opt/game")),
            ..Settings::default()
        };

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup_dir, Some(temp_dir.path().join("elsewhere")));
        assert_eq!(loaded.reference_dir, Some(PathBuf::from("/opt/game")));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.backup_dir.is_none());
    }

    #[test]
    fn test_invalid_settings_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }

    #[test]
    fn test_resolve_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::default();

        assert_eq!(settings.resolve_backup_dir(&paths), paths.backup_dir());
        assert_eq!(
            settings.resolve_reference_dir(Path::new("/srv/app")),
            PathBuf::from("/srv/app")
        );
    }

    #[test]
    fn test_relative_reference_dir_is_anchored_at_cwd() {
        let settings = Settings {
            reference_dir: Some(PathBuf::from("game")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_reference_dir(Path::new("/srv")),
            PathBuf::from("/srv/game")
        );

        let settings = Settings {
            reference_dir: Some(PathBuf::from("/opt/game")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_reference_dir(Path::new("/srv")),
            PathBuf::from("/opt/game")
        );
    }
}
