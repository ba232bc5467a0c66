//! Audit log of sync runs
//!
//! Every sheet created, block appended and receipt dropped is recorded in an
//! append-only line-delimited JSON file, tagged with the id of the run that
//! did it.

mod entry;
mod logger;

pub use entry::{AuditEntry, AuditEvent};
pub use logger::AuditLogger;
