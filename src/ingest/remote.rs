//! Remote receipt store
//!
//! The pipeline only needs three things from wherever receipts are uploaded
//! to: a credential check, a listing, and resumable chunked reads against a
//! stable identifier. [`DirectoryRemote`] provides them over a plain folder
//! (a synced drive, a network share, a scanner's output directory).

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{ReceiptError, ReceiptResult};
use crate::models::RemoteFileRef;

/// Which files in the store count as receipts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderFilter {
    /// Sub-folder of the store; empty means the store root
    pub folder: String,
    /// Extension without the dot, matched case-insensitively
    pub extension: String,
}

impl FolderFilter {
    pub fn new(folder: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            extension: extension.into(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// One piece of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Vec<u8>,
    /// No bytes remain after this chunk
    pub done: bool,
}

/// Source of receipt documents
pub trait RemoteStore {
    /// Verify access before anything else happens in a run
    fn authenticate(&mut self) -> ReceiptResult<()>;

    /// Candidate receipts matching `filter`
    fn list(&self, filter: &FolderFilter) -> ReceiptResult<Vec<RemoteFileRef>>;

    /// Bytes of `id` starting at `offset`
    fn fetch_chunk(&self, id: &str, offset: u64) -> ReceiptResult<Chunk>;
}

/// A [`RemoteStore`] over a local directory; ids are paths relative to the root
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
    chunk_size: usize,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            root: root.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> ReceiptResult<PathBuf> {
        let relative = Path::new(id);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ReceiptError::Remote(format!("Invalid document id: {}", id)));
        }
        Ok(self.root.join(relative))
    }
}

impl RemoteStore for DirectoryRemote {
    fn authenticate(&mut self) -> ReceiptResult<()> {
        match fs::read_dir(&self.root) {
            Ok(_) => Ok(()),
            Err(e) => Err(ReceiptError::Authentication(format!(
                "Cannot access {}: {}",
                self.root.display(),
                e
            ))),
        }
    }

    fn list(&self, filter: &FolderFilter) -> ReceiptResult<Vec<RemoteFileRef>> {
        let folder = if filter.folder.is_empty() {
            self.root.clone()
        } else {
            self.resolve(&filter.folder)?
        };

        let entries = fs::read_dir(&folder).map_err(|e| {
            ReceiptError::Remote(format!("Failed to list {}: {}", folder.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ReceiptError::Remote(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if !path.is_file() || !filter.accepts(&path) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let id = if filter.folder.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", filter.folder.trim_end_matches('/'), name)
            };
            files.push(RemoteFileRef::new(id, name));
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn fetch_chunk(&self, id: &str, offset: u64) -> ReceiptResult<Chunk> {
        let path = self.resolve(id)?;
        let remote_error =
            |e: std::io::Error| ReceiptError::Remote(format!("Failed to read {}: {}", id, e));

        let mut file = File::open(&path).map_err(remote_error)?;
        let len = file.metadata().map_err(remote_error)?.len();
        file.seek(SeekFrom::Start(offset)).map_err(remote_error)?;

        let mut data = Vec::with_capacity(self.chunk_size);
        file.take(self.chunk_size as u64)
            .read_to_end(&mut data)
            .map_err(remote_error)?;

        Ok(Chunk {
            done: offset + data.len() as u64 >= len,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_authenticate_missing_folder() {
        let dir = TempDir::new().unwrap();
        let mut remote = DirectoryRemote::new(dir.path().join("missing"), 16);
        let err = remote.authenticate().unwrap_err();
        assert!(matches!(err, ReceiptError::Authentication(_)));
    }

    #[test]
    fn test_list_filters_by_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("240310_b.pdf"), b"b").unwrap();
        fs::write(dir.path().join("240309_a.PDF"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let remote = DirectoryRemote::new(dir.path(), 16);
        let files = remote.list(&FolderFilter::new("", "pdf")).unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["240309_a.PDF", "240310_b.pdf"]);
    }

    #[test]
    fn test_list_sub_folder() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("biedronka")).unwrap();
        fs::write(dir.path().join("biedronka").join("240310_a.pdf"), b"a").unwrap();

        let remote = DirectoryRemote::new(dir.path(), 16);
        let files = remote.list(&FolderFilter::new("biedronka", "pdf")).unwrap();
        assert_eq!(files, vec![RemoteFileRef::new("biedronka/240310_a.pdf", "240310_a.pdf")]);

        let chunk = remote.fetch_chunk(&files[0].id, 0).unwrap();
        assert_eq!(chunk.data, b"a");
    }

    #[test]
    fn test_fetch_in_chunks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("doc.pdf"), b"0123456789").unwrap();
        let remote = DirectoryRemote::new(dir.path(), 4);

        let first = remote.fetch_chunk("doc.pdf", 0).unwrap();
        assert_eq!(first.data, b"0123");
        assert!(!first.done);

        let last = remote.fetch_chunk("doc.pdf", 8).unwrap();
        assert_eq!(last.data, b"89");
        assert!(last.done);
    }

    #[test]
    fn test_rejects_escaping_ids() {
        let dir = TempDir::new().unwrap();
        let remote = DirectoryRemote::new(dir.path(), 4);
        assert!(remote.fetch_chunk("../etc/passwd", 0).is_err());
    }
}
