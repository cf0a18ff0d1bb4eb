//! Configuration CLI commands
//!
//! Shows the resolved paths and persists directory settings.

use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use crate::backup::BackupStore;
use crate::config::paths::BackupPaths;
use crate::config::settings::Settings;
use crate::error::BackupResult;

/// Settings that can be changed from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Directory holding backup units
    BackupDir,
    /// Directory tracked paths are relative to
    ReferenceDir,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration and paths
    Show,

    /// Persist a directory setting
    Set {
        key: ConfigKey,
        /// New value (relative paths are taken from the working directory)
        value: PathBuf,
    },

    /// Remove a directory setting, restoring its default
    Unset { key: ConfigKey },
}

/// Handle a config command (`None` shows the configuration)
pub fn handle_config_command(
    paths: &BackupPaths,
    settings: &Settings,
    store: &BackupStore,
    cwd: &Path,
    cmd: Option<ConfigCommands>,
) -> BackupResult<()> {
    match cmd.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => {
            println!("backup-unit Configuration");
            println!("=========================");
            println!("Config directory:    {}", paths.base_dir().display());
            println!("Settings file:       {}", paths.settings_file().display());
            println!("Backup directory:    {}", store.backup_dir().display());
            println!("Reference directory: {}", store.reference_dir().display());
        }

        ConfigCommands::Set { key, value } => {
            let value = cwd.join(value);
            let mut updated = settings.clone();
            apply_setting(&mut updated, key, Some(value.clone()));
            updated.save(paths)?;
            println!("Set {} to {}", key_name(key), value.display());
        }

        ConfigCommands::Unset { key } => {
            let mut updated = settings.clone();
            apply_setting(&mut updated, key, None);
            updated.save(paths)?;
            println!("Unset {}", key_name(key));
        }
    }

    Ok(())
}

fn apply_setting(settings: &mut Settings, key: ConfigKey, value: Option<PathBuf>) {
    match key {
        ConfigKey::BackupDir => settings.backup_dir = value,
        ConfigKey::ReferenceDir => settings.reference_dir = value,
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::BackupDir => "backup-dir",
        ConfigKey::ReferenceDir => "reference-dir",
    }
}
