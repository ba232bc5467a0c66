//! The persistent receipt ledger
//!
//! An ordered collection of monthly sheets stored as one JSON document. Rows
//! are only ever appended; an existing row is never rewritten or reordered.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::file_io::{read_json_required, write_json_atomic, FileLock};
use super::sheet::{document_block, CellValue, Row, Sheet};
use crate::config::LedgerLayout;
use crate::error::{ReceiptError, ReceiptResult};
use crate::models::{Money, PeriodBucket, PeriodKey};

/// Name of the sheet a brand-new ledger starts with
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

/// A sheet with more rows than this gets two spacer rows before new content
const SPACER_THRESHOLD: usize = 4;

fn ledger_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(0[1-9]|[12][0-9]|3[01])\.(0[1-9]|1[0-2])\.((?:19|20)\d{2})")
            .expect("ledger date pattern is valid")
    })
}

/// Cutoff used when nothing has been recorded yet
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1800, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Lifecycle of the sheet collection
///
/// ```text
/// Empty --ensure_sheets--> Populated
/// DefaultNamed --ensure_sheets (rename default)--> Populated
/// ```
///
/// The default sheet is renamed at most once, when leaving `DefaultNamed`.
/// The state is written with the ledger for readers but always re-derived
/// from the sheets on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetCollectionState {
    /// No sheets at all
    Empty,
    /// Only the untouched default sheet exists
    DefaultNamed,
    /// Sheets are named after periods
    #[default]
    Populated,
}

impl SheetCollectionState {
    /// State implied by the sheets alone
    pub fn of(sheets: &[Sheet]) -> Self {
        match sheets {
            [] => Self::Empty,
            [only] if only.name == DEFAULT_SHEET_NAME && only.is_empty() => Self::DefaultNamed,
            _ => Self::Populated,
        }
    }
}

/// Serialized form of the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerData {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default, skip_deserializing)]
    state: SheetCollectionState,
    #[serde(default)]
    sheets: Vec<Sheet>,
}

fn default_schema_version() -> u32 {
    1
}

impl LedgerData {
    fn fresh() -> Self {
        Self {
            schema_version: default_schema_version(),
            state: SheetCollectionState::DefaultNamed,
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME)],
        }
    }
}

/// One receipt block written by [`Ledger::append`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedBlock {
    pub sheet: String,
    pub date: String,
    pub item_count: usize,
    pub total: Money,
    /// 1-based row of the block's date row
    pub first_row: usize,
}

/// The receipt ledger, loaded fully into memory
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    layout: LedgerLayout,
    data: LedgerData,
}

impl Ledger {
    /// Load the ledger at `path`, creating and saving a new one with a single
    /// empty default sheet if it doesn't exist yet
    pub fn open(path: impl Into<PathBuf>, layout: LedgerLayout) -> ReceiptResult<Self> {
        let ledger = Self::load(path, layout)?;
        if !ledger.path.exists() {
            ledger.save()?;
            info!(path = %ledger.path.display(), "created new ledger");
        }
        Ok(ledger)
    }

    /// Load the ledger at `path`, or start a fresh one in memory without
    /// touching the disk
    pub fn load(path: impl Into<PathBuf>, layout: LedgerLayout) -> ReceiptResult<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                layout,
                data: LedgerData::fresh(),
            });
        }

        let mut data: LedgerData = read_json_required(&path)?;
        data.state = SheetCollectionState::of(&data.sheets);
        debug!(path = %path.display(), sheets = data.sheets.len(), "ledger loaded");
        Ok(Self { path, layout, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SheetCollectionState {
        self.data.state
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.data.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.data.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.data.sheets.iter().find(|s| s.name == name)
    }

    /// The last sheet in collection order
    pub fn last_sheet(&self) -> Option<&Sheet> {
        self.data.sheets.last()
    }

    /// Newest receipt date recorded in the last sheet, at midnight
    ///
    /// Only first-column cells starting with `dd.mm.yyyy` count; headers,
    /// items and summaries are ignored. Returns [`epoch`] when nothing
    /// parses.
    pub fn latest_recorded_period_date(&self) -> NaiveDateTime {
        let Some(sheet) = self.last_sheet() else {
            return epoch();
        };

        sheet
            .rows
            .iter()
            .filter_map(|row| match row.first() {
                Some(CellValue::Text(text)) => ledger_date_regex().captures(text),
                _ => None,
            })
            .filter_map(|caps| {
                let day = caps[1].parse().ok()?;
                let month = caps[2].parse().ok()?;
                let year = caps[3].parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            })
            .max()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_else(epoch)
    }

    /// Make sure a sheet exists for every key
    ///
    /// In the `DefaultNamed` state the untouched default sheet is renamed to
    /// the first key instead of being left behind empty. Returns the names of
    /// sheets that were created or renamed; calling it again with the same
    /// keys returns nothing.
    pub fn ensure_sheets(&mut self, keys: &[PeriodKey]) -> Vec<String> {
        let mut keys: Vec<&PeriodKey> = keys.iter().collect();
        keys.sort();
        keys.dedup();

        let mut created = Vec::new();
        if keys.is_empty() {
            return created;
        }

        if self.data.state == SheetCollectionState::DefaultNamed {
            let untouched = match self.data.sheets.as_mut_slice() {
                [only] if only.is_empty() => Some(only),
                _ => None,
            };
            if let Some(sheet) = untouched {
                debug!(from = %sheet.name, to = %keys[0], "renaming default sheet");
                sheet.name = keys[0].to_string();
                created.push(sheet.name.clone());
            }
        }

        for key in keys {
            if self.sheet(key.as_str()).is_none() {
                self.data.sheets.push(Sheet::new(key.as_str()));
                created.push(key.to_string());
            }
        }

        self.data.state = SheetCollectionState::Populated;
        created
    }

    /// Append every receipt in `bucket`
    ///
    /// Periods are written in chronological order, receipts within a period by
    /// date. Each receipt block is built in full before it is attached, so a
    /// sheet never holds half a block. Missing sheets are created first.
    pub fn append(&mut self, bucket: &PeriodBucket) -> ReceiptResult<Vec<AppendedBlock>> {
        self.ensure_sheets(&bucket.keys());

        let mut appended = Vec::new();
        for (key, documents) in bucket.sorted_periods() {
            let layout = &self.layout;
            let sheet = self
                .data
                .sheets
                .iter_mut()
                .find(|s| s.name == key.as_str())
                .ok_or_else(|| ReceiptError::sheet_not_found(key.as_str()))?;

            let mut spacers = if sheet.rows.len() > SPACER_THRESHOLD { 2 } else { 0 };

            for document in documents {
                let mut block: Vec<Row> = std::iter::repeat_with(Row::blank).take(spacers).collect();
                spacers = 0;

                let first_row = sheet.rows.len() + block.len() + 1;
                block.extend(document_block(document, first_row, layout));
                sheet.rows.extend(block);

                appended.push(AppendedBlock {
                    sheet: sheet.name.clone(),
                    date: document.date_label(),
                    item_count: document.items.len(),
                    total: document.total(),
                    first_row,
                });
            }
        }

        Ok(appended)
    }

    /// Write the ledger to disk atomically
    ///
    /// Fails with [`ReceiptError::LedgerLocked`] when another process holds
    /// the ledger. The in-memory state is unaffected either way, so a failed
    /// save can simply be retried.
    pub fn save(&self) -> ReceiptResult<()> {
        let _lock = FileLock::acquire(&self.path)?;
        write_json_atomic(&self.path, &self.data)?;
        debug!(path = %self.path.display(), "ledger saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, ParsedDocument};
    use crate::services::aggregate;
    use crate::storage::sheet::Cell;
    use tempfile::TempDir;

    fn doc(y: i32, m: u32, d: u32, items: &[(&str, i64)]) -> ParsedDocument {
        ParsedDocument::new(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            items
                .iter()
                .map(|(name, cents)| LineItem::new(*name, Money::from_cents(*cents)))
                .collect(),
        )
    }

    fn open(dir: &TempDir) -> Ledger {
        Ledger::open(dir.path().join("ledger.json"), LedgerLayout::default()).unwrap()
    }

    fn keys(names: &[&str]) -> Vec<PeriodKey> {
        names.iter().map(|n| PeriodKey::new(*n)).collect()
    }

    #[test]
    fn test_open_creates_default_sheet() {
        let dir = TempDir::new().unwrap();
        let ledger = open(&dir);

        assert!(ledger.path().exists());
        assert_eq!(ledger.sheet_names(), vec![DEFAULT_SHEET_NAME]);
        assert_eq!(ledger.state(), SheetCollectionState::DefaultNamed);
        assert_eq!(ledger.latest_recorded_period_date(), epoch());
    }

    #[test]
    fn test_load_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = Ledger::load(&path, LedgerLayout::default()).unwrap();
        assert!(!path.exists());
        assert_eq!(ledger.state(), SheetCollectionState::DefaultNamed);
    }

    #[test]
    fn test_ensure_sheets_renames_default_once() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);

        let created = ledger.ensure_sheets(&keys(&["04.2024", "03.2024"]));
        assert_eq!(created, vec!["03.2024", "04.2024"]);
        assert_eq!(ledger.sheet_names(), vec!["03.2024", "04.2024"]);
        assert_eq!(ledger.state(), SheetCollectionState::Populated);

        let again = ledger.ensure_sheets(&keys(&["04.2024", "03.2024"]));
        assert!(again.is_empty());
        assert_eq!(ledger.sheet_names().len(), 2);

        // a later single-sheet situation must not trigger another rename
        let created = ledger.ensure_sheets(&keys(&["05.2024"]));
        assert_eq!(created, vec!["05.2024"]);
        assert_eq!(ledger.sheet_names(), vec!["03.2024", "04.2024", "05.2024"]);
    }

    #[test]
    fn test_ledger_without_sheets_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"schema_version": 1, "sheets": []}"#).unwrap();

        let mut ledger = Ledger::open(&path, LedgerLayout::default()).unwrap();
        assert_eq!(ledger.state(), SheetCollectionState::Empty);
        assert_eq!(ledger.latest_recorded_period_date(), epoch());

        assert_eq!(ledger.ensure_sheets(&keys(&["03.2024"])), vec!["03.2024"]);
        assert_eq!(ledger.state(), SheetCollectionState::Populated);
    }

    #[test]
    fn test_ensure_sheets_with_no_keys_keeps_default() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        assert!(ledger.ensure_sheets(&[]).is_empty());
        assert_eq!(ledger.state(), SheetCollectionState::DefaultNamed);
    }

    #[test]
    fn test_populated_single_sheet_is_not_renamed() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        ledger
            .append(&aggregate(vec![doc(2024, 3, 5, &[("Milk", 450)])]))
            .unwrap();

        ledger.ensure_sheets(&keys(&["04.2024"]));
        assert_eq!(ledger.sheet_names(), vec!["03.2024", "04.2024"]);
    }

    #[test]
    fn test_append_writes_blocks_in_date_order() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);

        let bucket = aggregate(vec![
            doc(2024, 3, 20, &[("Cheese", 999)]),
            doc(2024, 3, 5, &[("Milk", 450), ("Bread", 1200)]),
        ]);
        let blocks = ledger.append(&bucket).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].date, "05.03.2024 10:30");
        assert_eq!(blocks[0].first_row, 1);
        assert_eq!(blocks[0].total, Money::from_cents(1650));
        // 1 date + 1 header + 2 items + 1 summary + 2 blanks
        assert_eq!(blocks[1].first_row, 8);

        let sheet = ledger.sheet("03.2024").unwrap();
        assert_eq!(sheet.rows.len(), 7 + 6);
        assert_eq!(
            sheet.rows[10].cells[1].value,
            CellValue::Formula("=SUM(B10:B10)".into())
        );
    }

    #[test]
    fn test_append_separates_runs_with_spacers() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);

        ledger
            .append(&aggregate(vec![doc(2024, 3, 5, &[("Milk", 450)])]))
            .unwrap();
        let before = ledger.sheet("03.2024").unwrap().rows.clone();
        assert_eq!(before.len(), 6);

        let blocks = ledger
            .append(&aggregate(vec![doc(2024, 3, 9, &[("Eggs", 1099)])]))
            .unwrap();
        let after = &ledger.sheet("03.2024").unwrap().rows;

        assert_eq!(&after[..before.len()], before.as_slice());
        assert!(after[6].is_blank() && after[7].is_blank());
        assert_eq!(blocks[0].first_row, 9);
        assert_eq!(
            after[8].first(),
            Some(&CellValue::Text("09.03.2024 10:30".into()))
        );
        assert_eq!(
            after[11].cells[1].value,
            CellValue::Formula("=SUM(B11:B11)".into())
        );
    }

    #[test]
    fn test_latest_recorded_date_reads_last_sheet() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        ledger
            .append(&aggregate(vec![
                doc(2024, 3, 28, &[("a", 100)]),
                doc(2024, 4, 2, &[("b", 100)]),
                doc(2024, 4, 17, &[("c", 100)]),
            ]))
            .unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 4, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(ledger.latest_recorded_period_date(), expected);
    }

    #[test]
    fn test_latest_date_is_monotonic() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);

        let mut previous = ledger.latest_recorded_period_date();
        for (m, d) in [(1, 10), (1, 25), (2, 3)] {
            ledger
                .append(&aggregate(vec![doc(2024, m, d, &[("x", 100)])]))
                .unwrap();
            let current = ledger.latest_recorded_period_date();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_save_and_reopen_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        ledger
            .append(&aggregate(vec![doc(2024, 3, 5, &[("Milk", 450)])]))
            .unwrap();
        ledger.save().unwrap();

        let reopened = open(&dir);
        assert_eq!(reopened.sheets(), ledger.sheets());
        assert_eq!(reopened.state(), SheetCollectionState::Populated);
    }

    #[test]
    fn test_saved_prices_are_currency_units() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        ledger
            .append(&aggregate(vec![doc(2024, 3, 5, &[("Milk", 450)])]))
            .unwrap();
        ledger.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(ledger.path()).unwrap()).unwrap();
        let price = &raw["sheets"][0]["rows"][2]["cells"][1]["value"];
        assert_eq!(price["type"], "amount");
        assert_eq!(price["value"], serde_json::json!(4.5));
    }

    #[test]
    fn test_state_is_derived_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"sheets": [{"name": "Sheet", "rows": []}]}"#).unwrap();

        let mut ledger = Ledger::open(&path, LedgerLayout::default()).unwrap();
        assert_eq!(ledger.state(), SheetCollectionState::DefaultNamed);
        assert_eq!(ledger.ensure_sheets(&keys(&["03.2024"])), vec!["03.2024"]);
        assert_eq!(ledger.sheet_names(), vec!["03.2024"]);
    }

    #[test]
    fn test_stored_state_does_not_override_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(
            &path,
            r#"{"state": "populated", "sheets": [{"name": "Sheet", "rows": []}]}"#,
        )
        .unwrap();
        let ledger = Ledger::open(&path, LedgerLayout::default()).unwrap();
        assert_eq!(ledger.state(), SheetCollectionState::DefaultNamed);

        std::fs::write(
            &path,
            r#"{"state": "default_named", "sheets": [{"name": "03.2024", "rows": []}]}"#,
        )
        .unwrap();
        let ledger = Ledger::open(&path, LedgerLayout::default()).unwrap();
        assert_eq!(ledger.state(), SheetCollectionState::Populated);
    }

    #[test]
    fn test_save_reports_lock_and_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        let saved = std::fs::read_to_string(ledger.path()).unwrap();

        ledger
            .append(&aggregate(vec![doc(2024, 3, 5, &[("Milk", 450)])]))
            .unwrap();

        let lock = FileLock::acquire(ledger.path()).unwrap();
        let err = ledger.save().unwrap_err();
        assert!(err.is_locked());
        assert_eq!(std::fs::read_to_string(ledger.path()).unwrap(), saved);

        drop(lock);
        ledger.save().unwrap();
        assert_ne!(std::fs::read_to_string(ledger.path()).unwrap(), saved);
    }

    #[test]
    fn test_ignores_non_date_cells() {
        let dir = TempDir::new().unwrap();
        let mut ledger = open(&dir);
        ledger.ensure_sheets(&keys(&["03.2024"]));
        ledger.data.sheets[0].rows.push(Row::new(vec![Cell::text("Sum")]));
        ledger.data.sheets[0]
            .rows
            .push(Row::new(vec![Cell::text("35.03.2024 10:00")]));
        assert_eq!(ledger.latest_recorded_period_date(), epoch());
    }
}
