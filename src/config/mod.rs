//! Configuration module for backup-unit
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::Settings;
