//! Money type for receipt amounts
//!
//! Internally stores amounts in hundredths (i64) so sums never drift. Receipts
//! print amounts with a decimal comma, so parsing accepts either separator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// A monetary amount stored as hundredths of the currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from hundredths
    ///
    /// # Examples
    /// ```
    /// use receipt_ledger::models::Money;
    /// let amount = Money::from_cents(450);
    /// assert_eq!(amount.to_string(), "4.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units, truncated toward zero
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Fractional part (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Value as a spreadsheet number
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Nearest amount to a spreadsheet number; `None` for NaN, infinities
    /// and values out of range
    pub fn from_f64(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Parse an amount such as `"12,00"`, `"4.50"` or `"7"`
    ///
    /// The decimal comma is normalized to a dot first. At most two fractional
    /// digits are accepted; anything else is rejected rather than rounded.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let normalized = s.trim().replace(',', ".");

        let (negative, digits) = match normalized.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, normalized.as_str()),
        };

        let invalid = || MoneyParseError::InvalidFormat(s.to_string());

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty()
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > 2
        {
            return Err(invalid());
        }

        let units: i64 = whole.parse().map_err(|_| invalid())?;
        let hundredths: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(hundredths))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(450).to_string(), "4.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(Money::parse("4,50").unwrap().cents(), 450);
        assert_eq!(Money::parse("123,99").unwrap().cents(), 12399);
        assert_eq!(Money::parse("0,05").unwrap().cents(), 5);
    }

    #[test]
    fn test_parse_decimal_dot() {
        assert_eq!(Money::parse("12.00").unwrap().cents(), 1200);
        assert_eq!(Money::parse("7").unwrap().cents(), 700);
        assert_eq!(Money::parse("7.5").unwrap().cents(), 750);
        assert_eq!(Money::parse("-1,00").unwrap().cents(), -100);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("4,5O").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse(",50").is_err());
    }

    #[test]
    fn test_sum_and_f64() {
        let total: Money = [450, 1200, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1655);
        assert!((total.as_f64() - 16.55).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_f64_rounds_to_hundredths() {
        assert_eq!(Money::from_f64(4.5), Some(Money::from_cents(450)));
        assert_eq!(Money::from_f64(16.55), Some(Money::from_cents(1655)));
        assert_eq!(Money::from_f64(-0.1), Some(Money::from_cents(-10)));
        assert_eq!(Money::from_f64(f64::NAN), None);
        assert_eq!(Money::from_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");
    }
}
