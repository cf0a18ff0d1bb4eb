//! backup-unit - Filesystem-only backups for self-updating applications
//!
//! Before an installer or updater overwrites or deletes files belonging to an
//! installed application, it records each file's prior state in a backup
//! unit. The unit can later put every file back, or be deleted once the
//! update is known to be good.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `backup`: Backup units, manifests, restore reports and the unit store
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `cli`: Command handlers for the `backup-unit` binary
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use backup_unit::backup::BackupUnit;
//!
//! let mut unit = BackupUnit::new("/opt/game/Backups", "/opt/game");
//! unit.add("Plugins/Mod.dll")?;
//! // ... update fails ...
//! let report = unit.restore();
//! assert!(report.is_complete());
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;

pub use backup::{BackupStore, BackupUnit, RestoreReport};
pub use error::{BackupError, BackupResult};
