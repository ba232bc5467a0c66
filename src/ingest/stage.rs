//! Local staging area
//!
//! Downloaded bytes and their transcriptions live here between pipeline
//! steps. A staged `.txt` file doubles as the record that a receipt has been
//! written to the ledger.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ReceiptError, ReceiptResult};

/// A flat directory of staged files
#[derive(Debug, Clone)]
pub struct LocalStage {
    dir: PathBuf,
}

impl LocalStage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a staged file
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn ensure_dir(&self) -> ReceiptResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ReceiptError::Io(format!(
                "Failed to create staging directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    /// Store `text` under `name`, replacing any previous file
    pub fn write(&self, name: &str, text: &str) -> ReceiptResult<PathBuf> {
        self.write_bytes(name, text.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> ReceiptResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_of(name);
        fs::write(&path, bytes)
            .map_err(|e| ReceiptError::Io(format!("Failed to stage {}: {}", name, e)))?;
        debug!(name, size = bytes.len(), "staged");
        Ok(path)
    }

    pub fn read_text(&self, name: &str) -> ReceiptResult<String> {
        fs::read_to_string(self.path_of(name))
            .map_err(|e| ReceiptError::Io(format!("Failed to read staged {}: {}", name, e)))
    }

    /// Names of staged files with extension `ext`; a missing directory is empty
    pub fn list_names(&self, ext: &str) -> ReceiptResult<HashSet<String>> {
        if !self.dir.exists() {
            return Ok(HashSet::new());
        }

        let entries = fs::read_dir(&self.dir)
            .map_err(|e| ReceiptError::Io(format!("Failed to list staging directory: {}", e)))?;

        let mut names = HashSet::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| ReceiptError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            let matches = path
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
                .unwrap_or(false);
            if matches && path.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// Remove one staged file; a missing file is not an error
    pub fn remove(&self, name: &str) -> ReceiptResult<()> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReceiptError::Io(format!(
                "Failed to remove staged {}: {}",
                name, e
            ))),
        }
    }

    /// Remove every staged file with extension `ext`, returning how many went
    pub fn delete(&self, ext: &str) -> ReceiptResult<usize> {
        let names = self.list_names(ext)?;
        for name in &names {
            self.remove(name)?;
        }
        Ok(names.len())
    }
}
