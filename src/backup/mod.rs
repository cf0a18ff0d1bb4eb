//! Backup units for self-updating applications
//!
//! Before an updater overwrites or deletes a file it hands the file to a
//! [`BackupUnit`], which keeps enough on disk to undo the change later.
//!
//! # On-disk Layout
//!
//! ```text
//! <backup_dir>/
//!   <unit_name>/
//!     $manifest$.txt          one tracked relative path per line
//!     <relative/path/...>     original bytes, or a zero-length tombstone
//! ```
//!
//! A zero-length shadow file means the path did not exist when it was
//! tracked; restoring it deletes the target. Units written before manifests
//! existed are still readable: their tracked paths are inferred from the
//! files present.
//!
//! # Example
//!
//! ```rust,ignore
//! use backup_unit::backup::BackupStore;
//!
//! let store = BackupStore::new("/opt/game/IPA/Backups", "/opt/game");
//! let mut unit = store.create_unit()?;
//!
//! unit.add("Plugins/Mod.dll")?;
//! // ... replace Plugins/Mod.dll ...
//!
//! // On failure, roll back
//! let report = unit.restore();
//! println!("{}", report.summary());
//! ```

mod manifest;
mod restore;
mod store;
mod unit;

pub use manifest::MANIFEST_FILE_NAME;
pub use restore::{RestoreAction, RestoreOutcome, RestoreReport};
pub use store::{BackupStore, UnitInfo};
pub use unit::{unit_name_for, BackupUnit, ShadowEntry, ShadowKind, UNIT_NAME_FORMAT};
