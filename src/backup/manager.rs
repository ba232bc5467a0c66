//! Backup manager for the ledger file

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::config::settings::BackupRetention;
use crate::error::{ReceiptError, ReceiptResult};

const BACKUP_PREFIX: &str = "ledger-";

/// Metadata about a backup
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Parsed from the file name
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Creates ledger backups and enforces retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(backup_dir: PathBuf, retention: BackupRetention) -> Self {
        Self {
            backup_dir,
            retention,
        }
    }

    /// Copy `ledger` into the backup directory
    ///
    /// Returns `None` when there is no ledger file yet.
    pub fn create_backup(&self, ledger: &Path) -> ReceiptResult<Option<PathBuf>> {
        if !ledger.exists() {
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            ReceiptError::Io(format!("Failed to create backup directory: {}", e))
        })?;

        let now = Utc::now();
        let filename = format!(
            "{}{}-{:03}.json",
            BACKUP_PREFIX,
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = self.backup_dir.join(&filename);

        fs::copy(ledger, &backup_path)
            .map_err(|e| ReceiptError::Io(format!("Failed to write backup file: {}", e)))?;

        debug!(path = %backup_path.display(), "ledger backed up");
        Ok(Some(backup_path))
    }

    /// All backups, newest first
    pub fn list_backups(&self) -> ReceiptResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| ReceiptError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| ReceiptError::Io(format!("Failed to read directory entry: {}", e)))?;

            if let Some(info) = parse_backup_info(&entry.path()) {
                backups.push(info);
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Delete all but the newest `retention.keep` backups
    pub fn enforce_retention(&self) -> ReceiptResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();

        for backup in self.list_backups()?.into_iter().skip(self.retention.keep) {
            fs::remove_file(&backup.path)
                .map_err(|e| ReceiptError::Io(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Back up `ledger`, then prune old backups
    pub fn create_backup_with_retention(&self, ledger: &Path) -> ReceiptResult<Option<PathBuf>> {
        let backup = self.create_backup(ledger)?;
        if backup.is_some() {
            self.enforce_retention()?;
        }
        Ok(backup)
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename.strip_prefix(BACKUP_PREFIX)?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = stamp.split('-').collect();
    let [date_part, time_part, millis] = parts.as_slice() else {
        return None;
    };

    if date_part.len() != 8 || time_part.len() != 6 || millis.len() != 3 {
        return None;
    }

    let year: i32 = date_part[0..4].parse().ok()?;
    let month: u32 = date_part[4..6].parse().ok()?;
    let day: u32 = date_part[6..8].parse().ok()?;
    let hour: u32 = time_part[0..2].parse().ok()?;
    let minute: u32 = time_part[2..4].parse().ok()?;
    let second: u32 = time_part[4..6].parse().ok()?;
    let millis: u32 = millis.parse().ok()?;

    let datetime = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, minute, second, millis)?;

    Some(DateTime::from_naive_utc_and_offset(datetime, Utc))
}
