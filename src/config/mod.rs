//! Configuration module for receipt-ledger
//!
//! - platform path resolution
//! - user settings persistence (OCR engine, inbox, ledger layout)

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{LedgerLayout, Settings};
