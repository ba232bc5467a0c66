//! Parsed receipt data
//!
//! A [`ParsedDocument`] only exists once a transaction date was recovered from
//! the OCR text; documents without one never make it past extraction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::period::PeriodKey;

/// Date format used for date rows in the ledger (`15.03.2024 18:42`)
pub const LEDGER_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// One purchased product line with its final price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name exactly as recognized, trimmed
    pub name: String,
    /// Price after any per-item discount
    pub price: Money,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// A receipt with its transaction time and items in printed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub date: NaiveDateTime,
    pub items: Vec<LineItem>,
}

impl ParsedDocument {
    pub fn new(date: NaiveDateTime, items: Vec<LineItem>) -> Self {
        Self { date, items }
    }

    /// Canonical date string written to the ledger
    pub fn date_label(&self) -> String {
        self.date.format(LEDGER_DATE_FORMAT).to_string()
    }

    /// Month this receipt belongs to
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::from_date(self.date.date())
    }

    /// Sum of all item prices
    pub fn total(&self) -> Money {
        self.items.iter().map(|item| item.price).sum()
    }
}
