//! `run` and `plan` commands

use std::path::PathBuf;

use clap::Args;

use crate::audit::AuditLogger;
use crate::backup::BackupManager;
use crate::config::{LedgerPaths, Settings};
use crate::display::{format_plan, format_report};
use crate::error::ReceiptResult;
use crate::ingest::{DirectoryRemote, DocumentTranscriber, LocalStage, PdfToPpm, TesseractEngine};
use crate::services::SyncService;
use crate::storage::Ledger;

/// Where to look for new receipts
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Inbox directory (overrides the configured one)
    #[arg(long, env = "RECEIPT_LEDGER_INBOX")]
    pub inbox: Option<PathBuf>,

    /// Only consider receipts in this sub-folder of the inbox
    #[arg(long)]
    pub folder: Option<String>,
}

impl SyncArgs {
    fn remote(&self, paths: &LedgerPaths, settings: &Settings) -> DirectoryRemote {
        let inbox = self
            .inbox
            .clone()
            .unwrap_or_else(|| settings.inbox_dir(paths));
        DirectoryRemote::new(inbox, settings.remote.chunk_size)
    }
}

/// Fetch, transcribe and record every new receipt
pub fn handle_run_command(
    paths: &LedgerPaths,
    settings: &Settings,
    args: &SyncArgs,
) -> ReceiptResult<()> {
    let mut remote = args.remote(paths, settings);
    let ocr = TesseractEngine::new(settings.ocr.clone());
    let rasterizer = PdfToPpm::new(settings.rasterizer.clone());
    let stage = LocalStage::new(paths.staging_dir());
    let transcriber = DocumentTranscriber::new(&stage, &ocr, &rasterizer);
    let backups = BackupManager::new(paths.backup_dir(), settings.backup_retention.clone());
    let audit = AuditLogger::new(paths.audit_log());

    let mut ledger = Ledger::load(paths.ledger_file(), settings.ledger.clone())?;

    let mut service = SyncService::new(&mut remote, &transcriber, &stage, settings)
        .with_backups(&backups)
        .with_audit(&audit);
    if let Some(folder) = &args.folder {
        service = service.with_folder(folder.clone());
    }

    let report = service.run(&mut ledger)?;
    print!("{}", format_report(&report));
    if !report.is_noop() {
        println!();
    }
    Ok(())
}

/// Show what `run` would fetch without fetching it
pub fn handle_plan_command(
    paths: &LedgerPaths,
    settings: &Settings,
    args: &SyncArgs,
) -> ReceiptResult<()> {
    let mut remote = args.remote(paths, settings);
    let ocr = TesseractEngine::new(settings.ocr.clone());
    let rasterizer = PdfToPpm::new(settings.rasterizer.clone());
    let stage = LocalStage::new(paths.staging_dir());
    let transcriber = DocumentTranscriber::new(&stage, &ocr, &rasterizer);

    let ledger = Ledger::load(paths.ledger_file(), settings.ledger.clone())?;

    let mut service = SyncService::new(&mut remote, &transcriber, &stage, settings);
    if let Some(folder) = &args.folder {
        service = service.with_folder(folder.clone());
    }

    let plan = service.plan(&ledger)?;
    print!("{}", format_plan(&plan));
    Ok(())
}
