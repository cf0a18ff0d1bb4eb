//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup store and settings.

pub mod config;
pub mod unit;

pub use config::{handle_config_command, ConfigCommands, ConfigKey};
pub use unit::{handle_unit_command, UnitCommands};
