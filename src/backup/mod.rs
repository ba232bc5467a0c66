//! Rolling ledger backups
//!
//! Before a run overwrites the ledger, the file on disk is copied to
//! `backups/ledger-YYYYMMDD-HHMMSS-mmm.json`. Only the newest copies are
//! kept; how many is configured by
//! [`BackupRetention`](crate::config::settings::BackupRetention).

mod manager;

pub use manager::{BackupInfo, BackupManager};
