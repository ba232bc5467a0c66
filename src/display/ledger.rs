//! Ledger and run report formatting

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::services::{SyncPlan, SyncReport};
use crate::storage::{Ledger, Sheet};

/// Spreadsheet column letter for a zero-based index (A..Z, AA..)
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Render a sheet as a table with spreadsheet row numbers and column letters
pub fn format_sheet(sheet: &Sheet) -> String {
    if sheet.is_empty() {
        return format!("Sheet '{}' is empty.", sheet.name);
    }

    let width = sheet
        .rows
        .iter()
        .map(|row| row.cells.len())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once(String::new()).chain((0..width).map(column_letter)),
    );

    for (i, row) in sheet.rows.iter().enumerate() {
        let cells = (0..width).map(|c| {
            row.cells
                .get(c)
                .map(|cell| cell.value.display())
                .unwrap_or_default()
        });
        builder.push_record(std::iter::once((i + 1).to_string()).chain(cells));
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    format!("{}\n{}", sheet.name, table)
}

/// One line per sheet with its row count
pub fn format_sheet_list(ledger: &Ledger) -> String {
    let mut output = String::new();
    for sheet in ledger.sheets() {
        output.push_str(&format!("{:<10} {:>5} rows\n", sheet.name, sheet.rows.len()));
    }
    output
}

/// Files a dry run would fetch
pub fn format_plan(plan: &SyncPlan) -> String {
    let mut output = format!(
        "Cutoff: {}  ({} listed, {} to fetch)\n",
        plan.cutoff.format("%d.%m.%Y"),
        plan.listed,
        plan.files.len()
    );
    for file in &plan.files {
        output.push_str(&format!("  {}\n", file.name));
    }
    output
}

/// Summary of a finished run
pub fn format_report(report: &SyncReport) -> String {
    if report.is_noop() {
        return "Nothing new to process.".to_string();
    }

    let mut output = format!(
        "Fetched {} receipt(s), appended {}, dropped {}\n",
        report.plan.files.len(),
        report.appended.len(),
        report.dropped.len()
    );

    for sheet in &report.created_sheets {
        output.push_str(&format!("  new sheet {}\n", sheet));
    }
    for (sheet, count) in report.appended_per_period() {
        output.push_str(&format!("  {}: {} receipt(s)\n", sheet, count));
    }
    for dropped in &report.dropped {
        output.push_str(&format!("  dropped {}: {}\n", dropped.name, dropped.reason));
    }
    output
}
