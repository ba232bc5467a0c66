//! Export module for receipt-ledger
//!
//! - CSV: one sheet, spreadsheet-compatible
//! - YAML: the whole ledger, human-readable

pub mod csv;
pub mod yaml;

pub use csv::export_sheet_csv;
pub use yaml::{export_ledger_yaml, LedgerExport};
