//! Custom error types for receipt-ledger
//!
//! This module defines the error hierarchy for the application using thiserror.
//! Extraction failures have their own small enum because they are per-document
//! and never abort a run; everything else is carried by [`ReceiptError`].

use std::path::PathBuf;

use thiserror::Error;

/// Why a single OCR transcription could not be turned into a receipt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No `dd.mm.yyyy HH:MM` timestamp anywhere in the text
    #[error("no transaction date found")]
    NoDateFound,

    /// A date was found but no line item matched either record shape
    #[error("no line items found")]
    NoRecordsFound,
}

/// The main error type for receipt-ledger operations
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A receipt could not be parsed
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The remote document store refused our credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Listing or downloading from the remote document store failed
    #[error("Remote store error: {0}")]
    Remote(String),

    /// The OCR engine or the PDF rasterizer failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The ledger file is held by another process
    #[error("Ledger is locked by another process: {}. Close it and run again", path.display())]
    LedgerLocked { path: PathBuf },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl ReceiptError {
    /// Create a "not found" error for ledger sheets
    pub fn sheet_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Sheet",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the ledger was locked at save time
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::LedgerLocked { .. })
    }
}

impl From<std::io::Error> for ReceiptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ReceiptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for receipt-ledger operations
pub type ReceiptResult<T> = Result<T, ReceiptError>;
