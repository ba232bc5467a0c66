//! YAML export of the whole ledger

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReceiptError, ReceiptResult};
use crate::storage::{Ledger, Sheet, SheetCollectionState};

/// Serialized form of a ledger export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerExport {
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub state: SheetCollectionState,
    pub sheets: Vec<Sheet>,
}

impl LedgerExport {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self {
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            state: ledger.state(),
            sheets: ledger.sheets().to_vec(),
        }
    }
}

/// Export the full ledger to YAML
pub fn export_ledger_yaml<W: Write>(ledger: &Ledger, mut writer: W) -> ReceiptResult<()> {
    let export = LedgerExport::from_ledger(ledger);
    let export_error = |e: std::io::Error| ReceiptError::Export(e.to_string());

    writeln!(writer, "# receipt-ledger export").map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# Source: {}", ledger.path().display()).map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| ReceiptError::Export(e.to_string()))?;

    Ok(())
}
