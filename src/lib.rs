//! receipt-ledger - scanned grocery receipts into a monthly spending ledger
//!
//! New receipts are picked up from an inbox, transcribed with OCR, parsed
//! into dated line items and appended to an append-only ledger with one sheet
//! per month.
//!
//! # Architecture
//!
//! - `config`: paths and user settings
//! - `error`: custom error types
//! - `models`: receipts, money and monthly grouping
//! - `services`: extraction, aggregation, sync planning and the sync run
//! - `ingest`: remote store, download, OCR and the staging area
//! - `storage`: the ledger file and its sheets
//! - `audit`: run audit log
//! - `backup`: rolling ledger backups
//! - `display` / `export`: terminal output and file exports
//!
//! # Example
//!
//! ```rust,ignore
//! use receipt_ledger::services::extract;
//!
//! let receipt = extract("15.03.2024 18:42\nMilk A 1.000 x 4,50 4,50\n")?;
//! assert_eq!(receipt.items[0].name, "Milk");
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ExtractionError, ReceiptError, ReceiptResult};
