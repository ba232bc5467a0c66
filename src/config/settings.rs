//! User settings for receipt-ledger
//!
//! Everything that used to be a hard-coded install path or label lives here:
//! the OCR engine, the PDF rasterizer, where new receipts arrive, and how the
//! ledger sheets are laid out. Settings are resolved once at startup and passed
//! down explicitly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::ReceiptError;

/// OCR engine invocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Path to (or name of) the tesseract binary
    pub engine_binary_path: PathBuf,
    /// Tesseract page segmentation mode (`--psm`)
    pub page_segmentation_mode: u8,
    /// Optional language pack (`-l pol`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            engine_binary_path: PathBuf::from("tesseract"),
            // single uniform block of text, which is what a till roll is
            page_segmentation_mode: 6,
            language: None,
        }
    }
}

/// PDF to image conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerSettings {
    /// Path to (or name of) the pdftoppm binary
    pub binary_path: PathBuf,
    /// Render resolution
    pub dpi: u32,
}

impl Default for RasterizerSettings {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }
}

/// Where new receipts are listed and downloaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Inbox directory; `None` means `<base>/inbox`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox_dir: Option<PathBuf>,
    /// Only files with this extension are considered receipts
    pub extension: String,
    /// Bytes requested per download chunk
    pub chunk_size: usize,
    /// How many times a failed chunk is requested again before giving up
    pub max_chunk_retries: u32,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            inbox_dir: None,
            extension: "pdf".to_string(),
            chunk_size: 256 * 1024,
            max_chunk_retries: 3,
        }
    }
}

/// Labels and formats used when writing ledger blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerLayout {
    pub name_header: String,
    pub price_header: String,
    /// Headers of the two manually-ticked split columns
    pub split_headers: [String; 2],
    pub summary_label: String,
    /// Number format applied to every price and summary cell
    pub currency_format: String,
}

/// Accounting format with a złoty suffix, as used by the receipts this tool reads
pub const DEFAULT_CURRENCY_FORMAT: &str = r#"_-* #,##0.00\ [$zł-409]_-;\-* #,##0.00\ [$zł-409]_-;_-* "-"??\ [$zł-409]_-;_-@_-"#;

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            name_header: "Name".to_string(),
            price_header: "Price".to_string(),
            split_headers: ["Split 1".to_string(), "Split 2".to_string()],
            summary_label: "Sum".to_string(),
            currency_format: DEFAULT_CURRENCY_FORMAT.to_string(),
        }
    }
}

/// Backup retention settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupRetention {
    /// Number of ledger backups to keep
    pub keep: usize,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep: 20 }
    }
}

/// User settings for receipt-ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub ocr: OcrSettings,

    #[serde(default)]
    pub rasterizer: RasterizerSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub ledger: LedgerLayout,

    /// Keep transcriptions in the staging area after a run.
    /// They are what stops a receipt from being processed twice.
    #[serde(default = "default_keep_staged_text")]
    pub keep_staged_text: bool,

    #[serde(default)]
    pub backup_retention: BackupRetention,
}

fn default_schema_version() -> u32 {
    1
}

fn default_keep_staged_text() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            ocr: OcrSettings::default(),
            rasterizer: RasterizerSettings::default(),
            remote: RemoteSettings::default(),
            ledger: LedgerLayout::default(),
            keep_staged_text: default_keep_staged_text(),
            backup_retention: BackupRetention::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, ReceiptError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                ReceiptError::Io(format!("Failed to read settings file: {}", e))
            })?;

            serde_json::from_str(&contents).map_err(|e| {
                ReceiptError::Config(format!("Failed to parse settings file: {}", e))
            })
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), ReceiptError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            ReceiptError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ReceiptError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Inbox directory, falling back to the default under the base dir
    pub fn inbox_dir(&self, paths: &LedgerPaths) -> PathBuf {
        self.remote
            .inbox_dir
            .clone()
            .unwrap_or_else(|| paths.inbox_dir())
    }
}
