//! Core data models for receipt-ledger
//!
//! Receipts, their line items and the monthly grouping they are written under.

pub mod document;
pub mod money;
pub mod period;
pub mod receipt;

pub use document::{RawDocument, RemoteFileRef};
pub use money::Money;
pub use period::{PeriodBucket, PeriodKey};
pub use receipt::{LineItem, ParsedDocument, LEDGER_DATE_FORMAT};
