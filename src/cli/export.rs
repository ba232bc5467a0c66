//! `export` command

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::ValueEnum;

use super::show::select_sheet;
use crate::config::{LedgerPaths, Settings};
use crate::error::{ReceiptError, ReceiptResult};
use crate::export::{export_ledger_yaml, export_sheet_csv};
use crate::storage::Ledger;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// One sheet as CSV
    Csv,
    /// The whole ledger as YAML
    Yaml,
}

/// Write the export to `output`, or stdout when no file is given
pub fn handle_export_command(
    paths: &LedgerPaths,
    settings: &Settings,
    format: ExportFormat,
    sheet: Option<&str>,
    output: Option<&PathBuf>,
) -> ReceiptResult<()> {
    let ledger = Ledger::load(paths.ledger_file(), settings.ledger.clone())?;

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                ReceiptError::Export(format!("Failed to create {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    match format {
        ExportFormat::Csv => export_sheet_csv(select_sheet(&ledger, sheet)?, writer)?,
        ExportFormat::Yaml => export_ledger_yaml(&ledger, writer)?,
    }

    if let Some(path) = output {
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}
