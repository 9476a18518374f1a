//! Common types used across the application

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar month, the billing period unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Absolute month number, usable for gap arithmetic
    pub fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    pub fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Why a row was skipped or degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MalformedRow,
    ConversionFailed,
}

/// Per-row warning carried alongside the pipeline output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDiagnostic {
    pub source: String,
    pub line: u64,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index_roundtrip() {
        let m = Month::new(2019, 1);
        assert_eq!(Month::from_index(m.index()), m);
        assert_eq!(Month::from_index(m.index() + 1), Month::new(2019, 2));
        assert_eq!(Month::from_index(m.index() - 1), Month::new(2018, 12));
    }

    #[test]
    fn test_month_from_date() {
        let date = NaiveDate::from_ymd_opt(2019, 3, 14).unwrap();
        assert_eq!(Month::from_date(date), Month::new(2019, 3));
    }

    #[test]
    fn test_month_ordering_and_display() {
        assert!(Month::new(2018, 12) < Month::new(2019, 1));
        assert_eq!(Month::new(2019, 7).to_string(), "2019-07");
    }

    #[test]
    fn test_month_next_rolls_over_year() {
        assert_eq!(Month::new(2019, 12).next(), Month::new(2020, 1));
    }
}
