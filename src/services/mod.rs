//! Service layer for receipt-ledger
//!
//! The pure pipeline stages (extraction, aggregation, sync planning) plus the
//! [`SyncService`] that runs them against the ledger and the collaborators.

pub mod aggregator;
pub mod extractor;
pub mod sync;
pub mod sync_planner;

pub use aggregator::aggregate;
pub use extractor::{extract, extract_date, extract_records, RecordMatch, RecordShape};
pub use sync::{DroppedDocument, SyncPlan, SyncReport, SyncService};
pub use sync_planner::{file_date, plan, staged_text_name, TEXT_EXTENSION};
