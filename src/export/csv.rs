//! CSV export of a single sheet
//!
//! Every row is padded to the sheet's widest row so blank spacer rows survive
//! as empty lines of separators. Formulas are written as their text.

use std::io::Write;

use crate::error::{ReceiptError, ReceiptResult};
use crate::storage::Sheet;

fn export_error(e: impl std::fmt::Display) -> ReceiptError {
    ReceiptError::Export(e.to_string())
}

/// Write `sheet` as CSV
pub fn export_sheet_csv<W: Write>(sheet: &Sheet, writer: W) -> ReceiptResult<()> {
    let width = sheet
        .rows
        .iter()
        .map(|row| row.cells.len())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut csv = ::csv::Writer::from_writer(writer);

    for row in &sheet.rows {
        let record = (0..width).map(|c| {
            row.cells
                .get(c)
                .map(|cell| cell.value.display())
                .unwrap_or_default()
        });
        csv.write_record(record).map_err(export_error)?;
    }

    csv.flush().map_err(export_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerLayout;
    use crate::models::{LineItem, Money, ParsedDocument};
    use crate::storage::sheet::document_block;
    use chrono::NaiveDate;

    #[test]
    fn test_export_block() {
        let document = ParsedDocument::new(
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(18, 42, 0)
                .unwrap(),
            vec![LineItem::new("Milk, 2%", Money::from_cents(450))],
        );
        let mut sheet = Sheet::new("03.2024");
        sheet
            .rows
            .extend(document_block(&document, 1, &LedgerLayout::default()));

        let mut out = Vec::new();
        export_sheet_csv(&sheet, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "15.03.2024 18:42,,,");
        assert_eq!(lines[1], "Name,Price,Split 1,Split 2");
        assert_eq!(lines[2], "\"Milk, 2%\",4.50,,");
        assert!(lines[3].starts_with("Sum,=SUM(B3:B3),"));
        assert_eq!(lines[4], ",,,");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_export_empty_sheet() {
        let mut out = Vec::new();
        export_sheet_csv(&Sheet::new("Sheet"), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
