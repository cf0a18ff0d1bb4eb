use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use backup_unit::backup::BackupStore;
use backup_unit::cli::{handle_config_command, handle_unit_command, ConfigCommands, UnitCommands};
use backup_unit::config::{paths::BackupPaths, settings::Settings};

#[derive(Parser)]
#[command(
    name = "backup-unit",
    version,
    about = "Back up files before an update changes them, and roll the update back",
    long_about = "backup-unit records the original state of files before an installer \
                  or updater overwrites or deletes them, and restores that state on \
                  demand. Each run of an update gets its own backup unit."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding backup units (overrides settings)
    #[arg(long, global = true, env = "BACKUP_UNIT_BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// Directory tracked paths are relative to (defaults to the working directory)
    #[arg(long, global = true, env = "BACKUP_UNIT_REFERENCE_DIR")]
    reference_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Unit(UnitCommands),

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommands>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = BackupPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let backup_dir = cli
        .backup_dir
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| settings.resolve_backup_dir(&paths));
    let reference_dir = cli
        .reference_dir
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| settings.resolve_reference_dir(&cwd));
    debug!(
        backup_dir = %backup_dir.display(),
        reference_dir = %reference_dir.display(),
        "resolved directories"
    );

    let store = BackupStore::new(backup_dir, reference_dir);

    match cli.command {
        Some(Commands::Unit(cmd)) => handle_unit_command(&store, cmd)?,
        Some(Commands::Config { action }) => {
            handle_config_command(&paths, &settings, &store, &cwd, action)?
        }
        None => {
            println!("backup-unit - file backups for self-updating applications");
            println!();
            println!("Run 'backup-unit --help' for usage information.");
        }
    }

    Ok(())
}
