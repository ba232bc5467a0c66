//! Receipt text extraction
//!
//! Turns one OCR transcription into a [`ParsedDocument`]. Recognition is noisy,
//! but the till printout is very regular in its punctuation, so both grammars
//! anchor on structure (tax code letter, `d.ddd` quantity, decimal comma, the
//! literal word `Rabat`) rather than on the product names themselves.
//!
//! Two record shapes are recognized:
//!
//! ```text
//! Discounted:  Ser gouda A 1.000 x 5,99 5,99
//!              Rabat -1,00
//!              4,99                            -> ("Ser gouda", 4.99)
//!
//! Plain:       Mleko 2% A 1.000 x 4,50 4,50    -> ("Mleko 2%", 4.50)
//! ```
//!
//! The discounted shape is tried first at every position and the whole span it
//! consumes is skipped afterwards, so a discounted item is never also counted
//! at its pre-discount price.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

use crate::error::ExtractionError;
use crate::models::{LineItem, Money, ParsedDocument};

/// `dd.mm.yyyy HH:MM` with `/`, `-` or `.` between the date parts
const DATE_PATTERN: &str = r"(?P<day>0[1-9]|[12][0-9]|3[01])[/\-.](?P<month>0[1-9]|1[0-2])[/\-.](?P<year>(?:19|20)\d{2}) (?P<hour>[01]\d|2[0-3]):(?P<minute>[0-5]\d)";

/// Everything up to and including the optional unit price of an item line.
/// `{n}` is replaced with the capture name for the product name.
const ITEM_HEAD: &str = r"(?P<{n}>.+?) [A-Z] (?:[1-9][0-9]|[0-9])\.[0-9]{3} [xX]?[xX]? ?(?:(?:[1-9][0-9][0-9]|[1-9][0-9]|[0-9]|\S+)(?:[,.][0-9]{2})? )?";

/// Line total, then the discount line (possibly after a page break), then
/// the adjusted total, which is what gets recorded.
const DISCOUNT_TAIL: &str = r"(?:[1-9][0-9][0-9]|[1-9][0-9]|[0-9]),[0-9]{2}\W+(?:.+Strona.+\W+)?Rabat [-~“]?(?:[1-9][0-9][0-9]|[1-9][0-9]|[0-9])[,.][0-9]{2}\W+(?P<discounted_price>[1-9][0-9][0-9],[0-9]{2}|[1-9][0-9],[0-9]{2}|[0-9][,.][0-9]{2})";

const PLAIN_TAIL: &str = r"(?P<plain_price>(?:[1-9][0-9][0-9]|[1-9][0-9]|[0-9])[,.][0-9]{2})";

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"))
}

fn record_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let discounted = format!("{}{}", ITEM_HEAD.replace("{n}", "discounted_name"), DISCOUNT_TAIL);
        let plain = format!("{}{}", ITEM_HEAD.replace("{n}", "plain_name"), PLAIN_TAIL);
        // alternation order is the precedence rule
        Regex::new(&format!("(?:{})|(?:{})", discounted, plain)).expect("record pattern is valid")
    })
}

/// Which of the two record shapes produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Discounted,
    Plain,
}

/// One matched item line before it becomes a [`LineItem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMatch {
    pub name: String,
    /// Price text with the decimal separator normalized to `.`
    pub price: String,
    pub shape: RecordShape,
    /// Byte offset of the match in the source text
    pub offset: usize,
}

impl RecordMatch {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let offset = caps.get(0)?.start();
        let (name, price, shape) = match caps.name("discounted_price") {
            Some(price) => (caps.name("discounted_name")?, price, RecordShape::Discounted),
            None => (
                caps.name("plain_name")?,
                caps.name("plain_price")?,
                RecordShape::Plain,
            ),
        };

        Some(Self {
            name: name.as_str().trim().to_string(),
            price: price.as_str().replace(',', "."),
            shape,
            offset,
        })
    }
}

/// Find the transaction timestamp
///
/// The first occurrence that is a real calendar date wins; receipts repeat the
/// date in the footer and only the header one is trusted.
pub fn extract_date(text: &str) -> Result<NaiveDateTime, ExtractionError> {
    date_regex()
        .captures_iter(text)
        .find_map(|caps| {
            let field = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
            let year = caps.name("year")?.as_str().parse::<i32>().ok()?;
            NaiveDate::from_ymd_opt(year, field("month")?, field("day")?)?
                .and_hms_opt(field("hour")?, field("minute")?, 0)
        })
        .ok_or(ExtractionError::NoDateFound)
}

/// All non-overlapping item records, in the order they appear
pub fn extract_records(text: &str) -> Vec<RecordMatch> {
    record_regex()
        .captures_iter(text)
        .filter_map(|caps| RecordMatch::from_captures(&caps))
        .collect()
}

/// Parse a full receipt
///
/// # Errors
///
/// [`ExtractionError::NoDateFound`] when no timestamp is present and
/// [`ExtractionError::NoRecordsFound`] when no item line matched.
pub fn extract(text: &str) -> Result<ParsedDocument, ExtractionError> {
    let date = extract_date(text)?;

    let items: Vec<LineItem> = extract_records(text)
        .into_iter()
        .filter_map(|record| {
            // the grammar only admits well-formed amounts, so this never drops
            Money::parse(&record.price)
                .ok()
                .map(|price| LineItem::new(record.name, price))
        })
        .collect();

    if items.is_empty() {
        return Err(ExtractionError::NoRecordsFound);
    }

    Ok(ParsedDocument::new(date, items))
}
