//! Monthly grouping of receipts
//!
//! A [`PeriodKey`] is the `MM.YYYY` name of a ledger sheet. Keys compare equal
//! only when their strings are identical, but they sort chronologically so that
//! `12.2024` comes before `01.2025`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::receipt::ParsedDocument;

/// Month identity of a ledger sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Wrap an existing sheet name as-is
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Canonical key for the month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!("{:02}.{}", date.month(), date.year()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(year, month)` when the key is in `MM.YYYY` form
    pub fn year_month(&self) -> Option<(i32, u32)> {
        let (month, year) = self.0.split_once('.')?;
        let month: u32 = month.trim().parse().ok()?;
        let year: i32 = year.trim().parse().ok()?;
        (1..=12).contains(&month).then_some((year, month))
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year_month()
            .cmp(&other.year_month())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipts of one run grouped by month
///
/// Built fresh from the current batch only; the ledger append is the only
/// place where new and previously recorded data meet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodBucket {
    periods: BTreeMap<PeriodKey, Vec<ParsedDocument>>,
}

impl PeriodBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a receipt under its own month. Nothing is deduplicated here.
    pub fn insert(&mut self, document: ParsedDocument) {
        self.periods
            .entry(document.period_key())
            .or_default()
            .push(document);
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Number of distinct months
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Total number of receipts across all months
    pub fn document_count(&self) -> usize {
        self.periods.values().map(Vec::len).sum()
    }

    /// Month keys in chronological order
    pub fn keys(&self) -> Vec<PeriodKey> {
        self.periods.keys().cloned().collect()
    }

    pub fn get(&self, key: &PeriodKey) -> Option<&[ParsedDocument]> {
        self.periods.get(key).map(Vec::as_slice)
    }

    /// Months in chronological order, each with its receipts sorted by date
    pub fn sorted_periods(&self) -> Vec<(&PeriodKey, Vec<&ParsedDocument>)> {
        self.periods
            .iter()
            .map(|(key, documents)| {
                let mut sorted: Vec<_> = documents.iter().collect();
                sorted.sort_by_key(|doc| doc.date);
                (key, sorted)
            })
            .collect()
    }
}
