//! Calendar month keys in "YYYY-MM" form, used to scope budgets.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{Error, error::FieldError};

/// A calendar month, e.g. "2024-06".
///
/// Ordering is chronological: by year, then by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    // Always in 1..=12.
    month: u8,
}

impl MonthKey {
    /// Parse a month key, which must match `^\d{4}-\d{2}$` with a month
    /// between 01 and 12.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] on the `month` field if `text` is not a
    /// valid month key.
    pub fn new(text: &str) -> Result<Self, Error> {
        let invalid = || {
            Error::Validation(
                FieldError::new(
                    "month",
                    format!("{text} is not a valid month format! Use YYYY-MM"),
                )
                .into(),
            )
        };

        let bytes = text.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(invalid());
        }

        let year: i32 = text[..4].parse().map_err(|_| invalid())?;
        let month: u8 = text[5..].parse().map_err(|_| invalid())?;

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        // `month` is kept in 1..=12 so the conversion cannot fail.
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    /// The month immediately before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Whether `date` falls within this month.
    pub fn contains(&self, date: Date) -> bool {
        *self == Self::from_date(date)
    }

    /// A human readable label such as "Jan 2024".
    pub fn label(&self) -> String {
        let name = match self.month() {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        };

        format!("{name} {}", self.year)
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MonthKey::new(s)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MonthKey::new(&value)
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

impl ToSql for MonthKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for MonthKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        MonthKey::new(value.as_str()?).map_err(|_| FromSqlError::InvalidType)
    }
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::Error;

    use super::MonthKey;

    #[test]
    fn parses_valid_month() {
        let month = MonthKey::new("2024-06").unwrap();

        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), Month::June);
        assert_eq!(month.to_string(), "2024-06");
    }

    #[test]
    fn rejects_malformed_months() {
        for text in ["2024-6", "24-06", "2024/06", "2024-06-01", "abcd-ef", "", " 2024-06"] {
            let result = MonthKey::new(text);

            assert!(
                matches!(result, Err(Error::Validation(ref errors)) if errors.has_field("month")),
                "expected {text:?} to be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(MonthKey::new("2024-00").is_err());
        assert!(MonthKey::new("2024-13").is_err());
    }

    #[test]
    fn previous_wraps_to_december() {
        let january = MonthKey::new("2024-01").unwrap();

        assert_eq!(january.previous(), MonthKey::new("2023-12").unwrap());
    }

    #[test]
    fn ordering_is_chronological() {
        let mut months = vec![
            MonthKey::new("2024-03").unwrap(),
            MonthKey::new("2023-12").unwrap(),
            MonthKey::new("2024-01").unwrap(),
        ];

        months.sort();

        let got: Vec<String> = months.iter().map(ToString::to_string).collect();
        assert_eq!(got, vec!["2023-12", "2024-01", "2024-03"]);
    }

    #[test]
    fn contains_checks_year_and_month() {
        let month = MonthKey::new("2024-06").unwrap();

        assert!(month.contains(date!(2024 - 06 - 30)));
        assert!(!month.contains(date!(2023 - 06 - 15)));
        assert!(!month.contains(date!(2024 - 07 - 01)));
    }

    #[test]
    fn label_uses_short_month_name_and_year() {
        assert_eq!(MonthKey::new("2024-01").unwrap().label(), "Jan 2024");
        assert_eq!(MonthKey::new("1999-12").unwrap().label(), "Dec 1999");
    }

    #[test]
    fn serializes_as_string() {
        let month = MonthKey::new("2024-06").unwrap();

        let json = serde_json::to_string(&month).unwrap();
        let parsed: MonthKey = serde_json::from_str(&json).unwrap();

        assert_eq!(json, "\"2024-06\"");
        assert_eq!(parsed, month);
    }
}
