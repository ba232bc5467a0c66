//! File I/O utilities with atomic writes and an exclusive-writer lock
//!
//! Writes go to a temp file that is renamed over the target, so a failed save
//! leaves the previous file untouched.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::ReceiptError;

/// Map an I/O failure on `path`. Access refusals mean another process holds
/// the file open, which is reported as a lock rather than a generic error.
fn storage_error(path: &Path, action: &str, e: std::io::Error) -> ReceiptError {
    if e.kind() == ErrorKind::PermissionDenied {
        ReceiptError::LedgerLocked {
            path: path.to_path_buf(),
        }
    } else {
        ReceiptError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
    }
}

/// Read JSON from a file, returning an error if the file doesn't exist
pub fn read_json_required<T, P>(path: P) -> Result<T, ReceiptError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Err(ReceiptError::Storage(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file = File::open(path).map_err(|e| storage_error(path, "open", e))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| ReceiptError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), ReceiptError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error(parent, "create directory", e))?;
    }

    // same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| storage_error(&temp_path, "create", e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| ReceiptError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| storage_error(&temp_path, "flush", e))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| storage_error(&temp_path, "sync", e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        storage_error(path, "replace", e)
    })?;

    Ok(())
}

/// Held while a file is being rewritten; removes its lock file on drop
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Lock file used for `path`
    pub fn lock_path_for(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        path.with_file_name(name)
    }

    /// Take the lock, failing with [`ReceiptError::LedgerLocked`] if some other
    /// process already holds it
    pub fn acquire(path: &Path) -> Result<Self, ReceiptError> {
        let lock_path = Self::lock_path_for(path);

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, "create directory", e))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { lock_path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ReceiptError::LedgerLocked {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(storage_error(&lock_path, "create lock", e)),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
