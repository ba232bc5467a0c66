//! `show` command

use crate::config::{LedgerPaths, Settings};
use crate::display::{format_sheet, format_sheet_list};
use crate::error::{ReceiptError, ReceiptResult};
use crate::storage::{Ledger, Sheet};

/// The named sheet, or the last one when no name is given
pub(crate) fn select_sheet<'l>(
    ledger: &'l Ledger,
    name: Option<&str>,
) -> ReceiptResult<&'l Sheet> {
    match name {
        Some(name) => ledger
            .sheet(name)
            .ok_or_else(|| ReceiptError::sheet_not_found(name)),
        None => ledger
            .last_sheet()
            .ok_or_else(|| ReceiptError::Validation("The ledger has no sheets".into())),
    }
}

/// Print one sheet (default: the last), or the list of sheets
pub fn handle_show_command(
    paths: &LedgerPaths,
    settings: &Settings,
    sheet: Option<&str>,
    list: bool,
) -> ReceiptResult<()> {
    let ledger = Ledger::load(paths.ledger_file(), settings.ledger.clone())?;

    if list {
        print!("{}", format_sheet_list(&ledger));
        return Ok(());
    }

    println!("{}", format_sheet(select_sheet(&ledger, sheet)?));
    Ok(())
}
