//! UK tax year identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A UK tax year, running 6 April to 5 April, written `YYYY-YY`.
///
/// # Example
///
/// ```
/// use paye_engine::models::TaxYear;
/// use chrono::NaiveDate;
///
/// let year: TaxYear = "2025-26".parse().unwrap();
/// assert_eq!(year.start_year(), 2025);
/// assert_eq!(year.to_string(), "2025-26");
///
/// let pay_day = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
/// assert_eq!(TaxYear::containing(pay_day), year);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxYear {
    start_year: i32,
}

impl TaxYear {
    /// Creates the tax year that begins on 6 April of `start_year`.
    pub const fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Returns the tax year a date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year();
        if (date.month(), date.day()) >= (4, 6) {
            Self::starting(year)
        } else {
            Self::starting(year - 1)
        }
    }

    /// The calendar year in which this tax year starts.
    pub const fn start_year(&self) -> i32 {
        self.start_year
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

impl FromStr for TaxYear {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidTaxYear {
            value: s.to_string(),
        };

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(invalid());
        }
        if !start.chars().chain(end.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let start_year: i32 = start.parse().map_err(|_| invalid())?;
        let end_suffix: i32 = end.parse().map_err(|_| invalid())?;
        if (start_year + 1).rem_euclid(100) != end_suffix {
            return Err(invalid());
        }

        Ok(Self::starting(start_year))
    }
}

impl TryFrom<String> for TaxYear {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaxYear> for String {
    fn from(year: TaxYear) -> Self {
        year.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tax_year() {
        let year: TaxYear = "2024-25".parse().unwrap();
        assert_eq!(year.start_year(), 2024);
    }

    #[test]
    fn test_parse_century_rollover() {
        let year: TaxYear = "2099-00".parse().unwrap();
        assert_eq!(year.start_year(), 2099);
        assert_eq!(year.to_string(), "2099-00");
    }

    #[test]
    fn test_parse_rejects_non_consecutive_years() {
        assert!("2025-27".parse::<TaxYear>().is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        for value in ["2025", "25-26", "2025/26", "abcd-ef", "", "2025-2026"] {
            assert!(value.parse::<TaxYear>().is_err(), "accepted {value:?}");
        }
    }

    #[test]
    fn test_containing_before_sixth_april() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        assert_eq!(TaxYear::containing(date), TaxYear::starting(2024));
    }

    #[test]
    fn test_containing_on_sixth_april() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
        assert_eq!(TaxYear::containing(date), TaxYear::starting(2025));
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&TaxYear::starting(2025)).unwrap();
        assert_eq!(json, "\"2025-26\"");
        let back: TaxYear = serde_json::from_str("\"2024-25\"").unwrap();
        assert_eq!(back, TaxYear::starting(2024));
        assert!(serde_json::from_str::<TaxYear>("\"2024-26\"").is_err());
    }
}
