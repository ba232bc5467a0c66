//! Documents as they come from the remote store

use serde::{Deserialize, Serialize};

/// A listed receipt file that has not been downloaded yet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteFileRef {
    /// Stable identifier used for chunked downloads
    pub id: String,
    /// File name; starts with a `YYMMDD` date prefix
    pub name: String,
}

impl RemoteFileRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A downloaded receipt. Consumed by OCR and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    /// Lowercased file extension, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}
