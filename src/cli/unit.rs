//! Backup unit CLI commands
//!
//! Implements track, restore, delete, list and show.

use std::path::PathBuf;

use clap::Subcommand;

use crate::backup::{BackupStore, BackupUnit};
use crate::display::{format_restore_report, format_unit_entries, format_unit_list};
use crate::error::{BackupError, BackupResult};

/// Backup unit subcommands
#[derive(Subcommand)]
pub enum UnitCommands {
    /// Back up files before they are changed
    Track {
        /// Files to back up (relative to the reference directory or absolute)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Add to this unit instead of starting a new one
        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Undo every change recorded by a unit
    Restore {
        /// Unit name (use 'latest' for most recent)
        unit: String,

        /// Keep the 'latest' unit after a successful restore
        #[arg(short, long)]
        keep: bool,
    },

    /// Delete a unit and all of its backup data
    Delete {
        /// Unit name
        unit: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List all backup units
    List {
        /// Show unit locations
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Show the files tracked by a unit
    Show {
        /// Unit name (use 'latest' for most recent)
        unit: String,
    },
}

/// Handle a backup unit command
pub fn handle_unit_command(store: &BackupStore, cmd: UnitCommands) -> BackupResult<()> {
    match cmd {
        UnitCommands::Track { files, unit } => {
            let mut backup = match unit {
                Some(name) => store.open_or_create(&name)?,
                None => store.create_unit()?,
            };

            let before = backup.len();
            backup.add_all(&files)?;
            println!(
                "Tracked {} file(s) in unit {}",
                backup.len() - before,
                backup.name()
            );
        }

        UnitCommands::Restore { unit, keep } => {
            let report = if is_latest(&unit) && !keep {
                store
                    .restore_latest()?
                    .ok_or_else(|| BackupError::unit_not_found("latest"))?
            } else {
                resolve_unit(store, &unit)?.restore()
            };

            println!("Restoring unit {}", report.unit_name);
            println!("{}", format_restore_report(&report));

            let failed = report.failures().len();
            if failed > 0 {
                return Err(BackupError::RestoreIncomplete {
                    unit: report.unit_name,
                    failed,
                });
            }
        }

        UnitCommands::Delete { unit, force } => {
            let backup = store.open_unit(&unit)?;

            if !force {
                println!(
                    "This will delete unit {} ({} tracked file(s)) at {}",
                    backup.name(),
                    backup.len(),
                    backup.root_path().display()
                );
                println!("To proceed, run again with --force flag:");
                println!("  backup-unit delete {} --force", unit);
                return Ok(());
            }

            backup.delete()?;
            println!("Deleted unit {}", unit);
        }

        UnitCommands::List { long } => {
            let units = store.list_units()?;
            println!("{}", format_unit_list(&units, long));
        }

        UnitCommands::Show { unit } => {
            let backup = resolve_unit(store, &unit)?;
            println!("{}", format_unit_entries(backup.name(), &backup.entries()));
        }
    }

    Ok(())
}

fn is_latest(unit: &str) -> bool {
    unit.eq_ignore_ascii_case("latest")
}

/// Resolve a unit name, handling the "latest" keyword
fn resolve_unit(store: &BackupStore, unit: &str) -> BackupResult<BackupUnit> {
    if is_latest(unit) {
        return store
            .latest_unit()?
            .ok_or_else(|| BackupError::unit_not_found("latest"));
    }
    store.open_unit(unit)
}
