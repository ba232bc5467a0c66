//! Audit entry data structures
//!
//! One entry per ledger-visible event of a sync run. All entries written by
//! the same run share its run id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Money;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// A period sheet was created, or the default sheet was renamed to one
    SheetCreated,
    /// A receipt block was written to a sheet
    BlockAppended,
    /// A receipt was skipped because it could not be parsed
    DocumentDropped,
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditEvent::SheetCreated => write!(f, "SHEET CREATED"),
            AuditEvent::BlockAppended => write!(f, "BLOCK APPENDED"),
            AuditEvent::DocumentDropped => write!(f, "DOCUMENT DROPPED"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the event occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Sync run that produced the event
    pub run_id: Uuid,

    pub event: AuditEvent,

    /// Sheet name or document name the event is about
    pub subject: String,

    /// Free-form detail: receipt date and item count, or the drop reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEntry {
    fn new(
        run_id: Uuid,
        event: AuditEvent,
        subject: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id,
            event,
            subject: subject.into(),
            detail,
        }
    }

    pub fn sheet_created(run_id: Uuid, sheet: impl Into<String>) -> Self {
        Self::new(run_id, AuditEvent::SheetCreated, sheet, None)
    }

    pub fn block_appended(
        run_id: Uuid,
        sheet: impl Into<String>,
        date: &str,
        item_count: usize,
        total: Money,
    ) -> Self {
        Self::new(
            run_id,
            AuditEvent::BlockAppended,
            sheet,
            Some(format!("{} ({} items, {})", date, item_count, total)),
        )
    }

    pub fn document_dropped(
        run_id: Uuid,
        document: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::new(
            run_id,
            AuditEvent::DocumentDropped,
            document,
            Some(reason.to_string()),
        )
    }

    /// One-line human-readable form
    pub fn format_human_readable(&self) -> String {
        let mut line = format!(
            "{} [{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            &self.run_id.to_string()[..8],
            self.event,
            self.subject
        );
        if let Some(detail) = &self.detail {
            line.push_str(": ");
            line.push_str(detail);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;

    #[test]
    fn test_block_appended_detail() {
        let run = Uuid::new_v4();
        let entry = AuditEntry::block_appended(
            run,
            "03.2024",
            "15.03.2024 18:42",
            2,
            Money::from_cents(1650),
        );

        assert_eq!(entry.event, AuditEvent::BlockAppended);
        assert_eq!(entry.subject, "03.2024");
        assert_eq!(entry.detail.as_deref(), Some("15.03.2024 18:42 (2 items, 16.50)"));
        assert_eq!(entry.run_id, run);
    }

    #[test]
    fn test_dropped_carries_reason() {
        let entry = AuditEntry::document_dropped(
            Uuid::new_v4(),
            "240310_a.pdf",
            ExtractionError::NoDateFound,
        );
        assert_eq!(entry.detail.as_deref(), Some("no transaction date found"));

        let line = entry.format_human_readable();
        assert!(line.contains("DOCUMENT DROPPED 240310_a.pdf: no transaction date found"));
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::sheet_created(Uuid::new_v4(), "03.2024");
        let json = serde_json::to_string(&entry).unwrap();

        assert!(json.contains("\"event\":\"sheet_created\""));
        assert!(!json.contains("detail"));

        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
