//! Sheet, row and cell model of the ledger
//!
//! A sheet is an append-only list of rows. Each receipt becomes one block:
//!
//! ```text
//! 15.03.2024 18:42
//! Name     | Price | Split 1 | Split 2
//! Milk     |  4.50 |         |
//! Bread    | 12.00 |         |
//! Sum      | =SUM(B3:B4) | =SUMIF(...) | =SUMIF(...)
//! (blank)
//! (blank)
//! ```
//!
//! The split columns are ticked by hand later, so the summary row holds live
//! formulas instead of computed values.

use serde::{Deserialize, Serialize};

use crate::config::LedgerLayout;
use crate::models::{Money, ParsedDocument};

/// Content of a single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Empty,
    Text(String),
    /// Stored as a number in currency units so formulas sum real amounts
    Amount(#[serde(with = "amount_units")] Money),
    /// Spreadsheet formula including the leading `=`
    Formula(String),
}

impl CellValue {
    /// Text for display and export
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) | CellValue::Formula(text) => text.clone(),
            CellValue::Amount(amount) => amount.to_string(),
        }
    }
}

mod amount_units {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::Money;

    pub fn serialize<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(amount.as_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_f64(value).ok_or_else(|| D::Error::custom(format!("invalid amount: {}", value)))
    }
}

/// A cell value with an optional number format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            number_format: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(text.into()),
            number_format: None,
        }
    }

    pub fn amount(amount: Money, format: &str) -> Self {
        Self {
            value: CellValue::Amount(amount),
            number_format: Some(format.to_string()),
        }
    }

    pub fn formula(formula: impl Into<String>, format: &str) -> Self {
        Self {
            value: CellValue::Formula(formula.into()),
            number_format: Some(format.to_string()),
        }
    }
}

/// One ledger row; an empty cell list is a blank spacer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.value == CellValue::Empty)
    }

    /// First column, if present
    pub fn first(&self) -> Option<&CellValue> {
        self.cells.first().map(|cell| &cell.value)
    }
}

/// A named sheet holding one month of receipts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rows of one receipt block, built completely before it touches a sheet
///
/// `first_row` is the 1-based spreadsheet row the block will start at; the
/// summary formulas reference absolute row numbers.
pub fn document_block(
    document: &ParsedDocument,
    first_row: usize,
    layout: &LedgerLayout,
) -> Vec<Row> {
    let format = layout.currency_format.as_str();
    let mut rows = Vec::with_capacity(document.items.len() + 5);

    rows.push(Row::new(vec![Cell::text(document.date_label())]));
    rows.push(Row::new(vec![
        Cell::text(&layout.name_header),
        Cell::text(&layout.price_header),
        Cell::text(&layout.split_headers[0]),
        Cell::text(&layout.split_headers[1]),
    ]));

    let start = first_row + rows.len();
    for item in &document.items {
        rows.push(Row::new(vec![
            Cell::text(&item.name),
            Cell::amount(item.price, format),
            Cell::empty(),
            Cell::empty(),
        ]));
    }
    let end = first_row + rows.len() - 1;

    let prices = format!("B{start}:B{end}");
    let first_split = format!("C{start}:C{end}");
    let second_split = format!("D{start}:D{end}");
    // items ticked in both columns are shared, so each side carries half
    let shared = format!("SUMIFS({prices},{second_split},TRUE,{first_split},TRUE)/2");

    rows.push(Row::new(vec![
        Cell::text(&layout.summary_label),
        Cell::formula(format!("=SUM({prices})"), format),
        Cell::formula(format!("=SUMIF({first_split},TRUE,{prices})-{shared}"), format),
        Cell::formula(format!("=SUMIF({second_split},TRUE,{prices})-{shared}"), format),
    ]));

    rows.push(Row::blank());
    rows.push(Row::blank());
    rows
}
