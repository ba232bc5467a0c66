//! Sync service: one run of the receipt pipeline
//!
//! ```text
//! authenticate -> cutoff -> list -> plan -> download -> transcribe
//!     -> extract -> aggregate -> append -> backup + save -> stage text
//! ```
//!
//! Download and OCR failures end the run before the ledger is touched.
//! Receipts that cannot be parsed are dropped and reported; the rest of the
//! batch carries on. Transcriptions are staged only once the ledger has been
//! saved, so a failed save leaves every receipt eligible for the next run.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::aggregator::aggregate;
use super::extractor::extract;
use super::sync_planner::{plan, staged_text_name, TEXT_EXTENSION};
use crate::audit::{AuditEntry, AuditLogger};
use crate::backup::BackupManager;
use crate::config::Settings;
use crate::error::{ExtractionError, ReceiptResult};
use crate::ingest::{download, FolderFilter, LocalStage, RemoteStore, Transcriber};
use crate::models::RemoteFileRef;
use crate::storage::{AppendedBlock, Ledger};

/// What a run would fetch
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Newest date already in the ledger, at midnight
    pub cutoff: NaiveDateTime,
    /// Number of candidate files in the remote store
    pub listed: usize,
    pub files: Vec<RemoteFileRef>,
}

/// A receipt that was fetched but could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedDocument {
    pub name: String,
    pub reason: ExtractionError,
}

/// Outcome of [`SyncService::run`]
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub plan: SyncPlan,
    pub created_sheets: Vec<String>,
    pub appended: Vec<AppendedBlock>,
    pub dropped: Vec<DroppedDocument>,
    pub backup: Option<PathBuf>,
}

impl SyncReport {
    /// Receipts appended per sheet, in the order they were written
    pub fn appended_per_period(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for block in &self.appended {
            match counts.last_mut() {
                Some((sheet, count)) if *sheet == block.sheet => *count += 1,
                _ => counts.push((block.sheet.as_str(), 1)),
            }
        }
        counts
    }

    /// Nothing was planned, so nothing was fetched or written
    pub fn is_noop(&self) -> bool {
        self.plan.files.is_empty()
    }
}

/// Drives a single sync run against injected collaborators
pub struct SyncService<'a> {
    remote: &'a mut dyn RemoteStore,
    transcriber: &'a dyn Transcriber,
    stage: &'a LocalStage,
    settings: &'a Settings,
    filter: FolderFilter,
    backups: Option<&'a BackupManager>,
    audit: Option<&'a AuditLogger>,
}

impl<'a> SyncService<'a> {
    pub fn new(
        remote: &'a mut dyn RemoteStore,
        transcriber: &'a dyn Transcriber,
        stage: &'a LocalStage,
        settings: &'a Settings,
    ) -> Self {
        Self {
            remote,
            transcriber,
            stage,
            settings,
            filter: FolderFilter::new("", settings.remote.extension.clone()),
            backups: None,
            audit: None,
        }
    }

    /// Only consider files in this sub-folder of the remote store
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.filter.folder = folder.into();
        self
    }

    /// Back up the ledger file before each save
    pub fn with_backups(mut self, backups: &'a BackupManager) -> Self {
        self.backups = Some(backups);
        self
    }

    /// Record run events in the audit log
    pub fn with_audit(mut self, audit: &'a AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Authenticate and work out what a run would fetch, without fetching it
    pub fn plan(&mut self, ledger: &Ledger) -> ReceiptResult<SyncPlan> {
        self.remote.authenticate()?;

        let cutoff = ledger.latest_recorded_period_date();
        let listing = self.remote.list(&self.filter)?;
        let present = self.stage.list_names(TEXT_EXTENSION)?;
        let files = plan(&listing, cutoff, &present);

        info!(
            cutoff = %cutoff.date(),
            listed = listing.len(),
            planned = files.len(),
            "sync planned"
        );

        Ok(SyncPlan {
            cutoff,
            listed: listing.len(),
            files,
        })
    }

    /// Run the whole pipeline once
    pub fn run(&mut self, ledger: &mut Ledger) -> ReceiptResult<SyncReport> {
        let run_id = Uuid::new_v4();
        let plan = self.plan(ledger)?;

        let mut report = SyncReport {
            run_id,
            plan,
            created_sheets: Vec::new(),
            appended: Vec::new(),
            dropped: Vec::new(),
            backup: None,
        };

        if report.is_noop() {
            info!("nothing new to process");
            return Ok(report);
        }

        let transcripts = self.transcribe_all(&report.plan.files)?;

        let mut documents = Vec::new();
        for (file, text) in &transcripts {
            match extract(text) {
                Ok(document) => documents.push(document),
                Err(reason) => {
                    warn!(name = %file.name, %reason, "dropping receipt");
                    report.dropped.push(DroppedDocument {
                        name: file.name.clone(),
                        reason,
                    });
                }
            }
        }

        let bucket = aggregate(documents);
        if !bucket.is_empty() {
            report.created_sheets = ledger.ensure_sheets(&bucket.keys());
            report.appended = ledger.append(&bucket)?;

            if let Some(backups) = self.backups {
                report.backup = backups.create_backup_with_retention(ledger.path())?;
            }
            if let Err(e) = ledger.save() {
                if e.is_locked() {
                    warn!(path = %ledger.path().display(), "ledger is locked, nothing was saved");
                }
                return Err(e);
            }
        }

        for (file, text) in &transcripts {
            self.stage.write(&staged_text_name(&file.name), text)?;
        }
        if !self.settings.keep_staged_text {
            self.stage.delete(TEXT_EXTENSION)?;
        }

        self.record(&report);

        info!(
            run_id = %run_id,
            appended = report.appended.len(),
            dropped = report.dropped.len(),
            "sync finished"
        );
        Ok(report)
    }

    fn transcribe_all(
        &self,
        files: &[RemoteFileRef],
    ) -> ReceiptResult<Vec<(RemoteFileRef, String)>> {
        let retries = self.settings.remote.max_chunk_retries;
        files
            .iter()
            .map(|file| {
                let raw = download(&*self.remote, file, retries)?;
                let text = self.transcriber.transcribe(&raw)?;
                Ok((file.clone(), text))
            })
            .collect()
    }

    /// The ledger is already saved at this point, so a failing audit write
    /// is reported but does not fail the run
    fn record(&self, report: &SyncReport) {
        let Some(audit) = self.audit else {
            return;
        };

        let run_id = report.run_id;
        let entries: Vec<AuditEntry> = report
            .created_sheets
            .iter()
            .map(|sheet| AuditEntry::sheet_created(run_id, sheet))
            .chain(report.appended.iter().map(|block| {
                AuditEntry::block_appended(
                    run_id,
                    &block.sheet,
                    &block.date,
                    block.item_count,
                    block.total,
                )
            }))
            .chain(
                report
                    .dropped
                    .iter()
                    .map(|d| AuditEntry::document_dropped(run_id, &d.name, &d.reason)),
            )
            .collect();

        if let Err(e) = audit.log_batch(&entries) {
            warn!(error = %e, "failed to write audit log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEvent;
    use crate::config::LedgerLayout;
    use crate::config::settings::BackupRetention;
    use crate::error::ReceiptError;
    use crate::ingest::Chunk;
    use crate::models::RawDocument;
    use crate::storage::FileLock;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// In-memory remote store; contents are the receipt text itself
    #[derive(Default)]
    struct FakeRemote {
        files: BTreeMap<String, String>,
        reject: bool,
    }

    impl FakeRemote {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(n, t)| (n.to_string(), t.to_string()))
                    .collect(),
                reject: false,
            }
        }
    }

    impl RemoteStore for FakeRemote {
        fn authenticate(&mut self) -> ReceiptResult<()> {
            if self.reject {
                Err(ReceiptError::Authentication("bad token".into()))
            } else {
                Ok(())
            }
        }

        fn list(&self, _filter: &FolderFilter) -> ReceiptResult<Vec<RemoteFileRef>> {
            Ok(self
                .files
                .keys()
                .map(|name| RemoteFileRef::new(name.clone(), name.clone()))
                .collect())
        }

        fn fetch_chunk(&self, id: &str, _offset: u64) -> ReceiptResult<Chunk> {
            let text = self
                .files
                .get(id)
                .ok_or_else(|| ReceiptError::Remote(format!("no such file {}", id)))?;
            Ok(Chunk {
                data: text.as_bytes().to_vec(),
                done: true,
            })
        }
    }

    struct PlainText;

    impl Transcriber for PlainText {
        fn transcribe(&self, document: &RawDocument) -> ReceiptResult<String> {
            Ok(String::from_utf8_lossy(&document.bytes).into_owned())
        }
    }

    struct BrokenOcr;

    impl Transcriber for BrokenOcr {
        fn transcribe(&self, _document: &RawDocument) -> ReceiptResult<String> {
            Err(ReceiptError::Ocr("tesseract exited with 1".into()))
        }
    }

    struct Env {
        dir: TempDir,
        stage: LocalStage,
        settings: Settings,
    }

    impl Env {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let stage = LocalStage::new(dir.path().join("staging"));
            Self {
                dir,
                stage,
                settings: Settings::default(),
            }
        }

        fn ledger_path(&self) -> PathBuf {
            self.dir.path().join("ledger.json")
        }

        fn ledger(&self) -> Ledger {
            Ledger::load(self.ledger_path(), LedgerLayout::default()).unwrap()
        }
    }

    const MARCH_5: &str = "Lidl\n05.03.2024 10:30\nMilk A 1.000 x 4,50 4,50\nBread B 2.000 12,00\n";
    const MARCH_20: &str = "20.03.2024 18:42\nCheese C 1.000 x 9,99 9,99\n";
    const APRIL_2: &str = "02.04.2024 08:15\nEggs A 1.000 x 10,99 10,99\n";
    const UNREADABLE: &str = "%%% smudged %%%";

    fn four_receipts() -> FakeRemote {
        FakeRemote::with(&[
            ("240305_lidl.pdf", MARCH_5),
            ("240320_cheese.pdf", MARCH_20),
            ("240402_eggs.pdf", APRIL_2),
            ("240403_smudged.pdf", UNREADABLE),
        ])
    }

    #[test]
    fn test_full_run() {
        let env = Env::new();
        let mut remote = four_receipts();
        let audit = AuditLogger::new(env.dir.path().join("audit.log"));
        let mut ledger = env.ledger();

        let report = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .with_audit(&audit)
            .run(&mut ledger)
            .unwrap();

        assert_eq!(report.plan.files.len(), 4);
        assert_eq!(report.created_sheets, vec!["03.2024", "04.2024"]);
        assert_eq!(report.appended_per_period(), vec![("03.2024", 2), ("04.2024", 1)]);
        assert_eq!(
            report.dropped,
            vec![DroppedDocument {
                name: "240403_smudged.pdf".into(),
                reason: ExtractionError::NoDateFound,
            }]
        );

        let saved = env.ledger();
        assert_eq!(saved.sheet_names(), vec!["03.2024", "04.2024"]);
        // 7 rows for two items, 6 for one, no spacers on a fresh sheet
        assert_eq!(saved.sheet("03.2024").unwrap().rows.len(), 7 + 6);

        // every fetched receipt is marked as processed, the unreadable one included
        let staged = env.stage.list_names(TEXT_EXTENSION).unwrap();
        assert_eq!(staged.len(), 4);
        assert!(staged.contains("240305_lidl.txt"));

        let events: Vec<AuditEvent> = audit
            .read_run(report.run_id)
            .unwrap()
            .iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(events.iter().filter(|e| **e == AuditEvent::SheetCreated).count(), 2);
        assert_eq!(events.iter().filter(|e| **e == AuditEvent::BlockAppended).count(), 3);
        assert_eq!(events.iter().filter(|e| **e == AuditEvent::DocumentDropped).count(), 1);
    }

    #[test]
    fn test_second_run_is_noop() {
        let env = Env::new();
        let mut remote = four_receipts();

        let mut ledger = env.ledger();
        SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap();
        let before = std::fs::read_to_string(env.ledger_path()).unwrap();

        let mut ledger = env.ledger();
        let report = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap();

        assert!(report.is_noop());
        assert!(report.appended.is_empty());
        assert_eq!(std::fs::read_to_string(env.ledger_path()).unwrap(), before);
    }

    #[test]
    fn test_cutoff_skips_already_recorded_days() {
        let env = Env::new();
        let mut ledger = env.ledger();
        let mut remote = FakeRemote::with(&[("240305_lidl.pdf", MARCH_5)]);
        SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap();
        env.stage.delete(TEXT_EXTENSION).unwrap();

        let mut remote = four_receipts();
        let planned = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .plan(&ledger)
            .unwrap();

        let names: Vec<_> = planned.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["240320_cheese.pdf", "240402_eggs.pdf", "240403_smudged.pdf"]
        );
        assert_eq!(planned.listed, 4);
    }

    #[test]
    fn test_authentication_failure_touches_nothing() {
        let env = Env::new();
        let mut remote = four_receipts();
        remote.reject = true;
        let mut ledger = env.ledger();

        let err = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap_err();

        assert!(matches!(err, ReceiptError::Authentication(_)));
        assert!(!env.ledger_path().exists());
        assert!(!env.stage.dir().exists());
    }

    #[test]
    fn test_ocr_failure_aborts_before_ledger() {
        let env = Env::new();
        let mut remote = four_receipts();
        let mut ledger = env.ledger();

        let err = SyncService::new(&mut remote, &BrokenOcr, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap_err();

        assert!(matches!(err, ReceiptError::Ocr(_)));
        assert_eq!(ledger.sheet_names(), vec!["Sheet"]);
        assert!(env.stage.list_names(TEXT_EXTENSION).unwrap().is_empty());
    }

    #[test]
    fn test_locked_ledger_leaves_receipts_unprocessed() {
        let env = Env::new();
        Ledger::open(env.ledger_path(), LedgerLayout::default()).unwrap();
        let before = std::fs::read_to_string(env.ledger_path()).unwrap();
        let _lock = FileLock::acquire(&env.ledger_path()).unwrap();

        let mut remote = four_receipts();
        let mut ledger = env.ledger();
        let err = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap_err();

        assert!(err.is_locked());
        assert_eq!(std::fs::read_to_string(env.ledger_path()).unwrap(), before);
        assert!(env.stage.list_names(TEXT_EXTENSION).unwrap().is_empty());
    }

    #[test]
    fn test_backup_taken_before_save() {
        let env = Env::new();
        Ledger::open(env.ledger_path(), LedgerLayout::default()).unwrap();
        let backups =
            BackupManager::new(env.dir.path().join("backups"), BackupRetention { keep: 5 });

        let mut remote = four_receipts();
        let mut ledger = env.ledger();
        let report = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .with_backups(&backups)
            .run(&mut ledger)
            .unwrap();

        let backup = report.backup.unwrap();
        let copy = Ledger::load(&backup, LedgerLayout::default()).unwrap();
        assert_eq!(copy.sheet_names(), vec!["Sheet"]);
    }

    #[test]
    fn test_staged_text_can_be_discarded() {
        let mut env = Env::new();
        env.settings.keep_staged_text = false;
        let mut remote = four_receipts();
        let mut ledger = env.ledger();

        let report = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap();

        assert_eq!(report.appended.len(), 3);
        assert!(env.stage.list_names(TEXT_EXTENSION).unwrap().is_empty());
    }

    #[test]
    fn test_all_dropped_leaves_ledger_alone() {
        let env = Env::new();
        let mut remote = FakeRemote::with(&[("240403_smudged.pdf", UNREADABLE)]);
        let mut ledger = env.ledger();

        let report = SyncService::new(&mut remote, &PlainText, &env.stage, &env.settings)
            .run(&mut ledger)
            .unwrap();

        assert_eq!(report.dropped.len(), 1);
        assert!(report.appended.is_empty());
        assert!(!env.ledger_path().exists());
    }
}
