// Calendar months - the unit of the lifetime grid

use crate::error::{Result, TimelineError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month (year + month). Day-of-month is never significant.
///
/// Ordering is chronological, so `a < b` reads "a is before b".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    // Field order matters for the derived Ord
    year: i32,
    month: u32,
}

impl YearMonth {
    pub const EPOCH: YearMonth = YearMonth { year: 1970, month: 1 };

    /// Build from a four-digit year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (0..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    /// Parse `YYYY-MM`. A trailing `-DD` is accepted when it forms a real
    /// calendar date and is then ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut parts = text.splitn(3, '-');
        let year = parts.next()?;
        let month = parts.next()?;

        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        if !year.bytes().all(|b| b.is_ascii_digit()) || !month.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let parsed = YearMonth::new(year.parse().ok()?, month.parse().ok()?)?;

        if let Some(day) = parts.next() {
            if day.len() != 2 || !day.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            NaiveDate::from_ymd_opt(parsed.year, parsed.month, day.parse().ok()?)?;
        }

        Some(parsed)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// This month shifted forward by `months`, rolling over year boundaries.
    ///
    /// The result may leave the four-digit range; it is still a valid value
    /// for ordering and display.
    pub fn add_months(self, months: u32) -> Self {
        let total = self.ordinal() + i64::from(months);
        YearMonth {
            year: total.div_euclid(12) as i32,
            month: (total.rem_euclid(12) + 1) as u32,
        }
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self> {
        YearMonth::parse(s).ok_or_else(|| TimelineError::invalid_date("month", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        YearMonth::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid month `{}`, expected YYYY-MM", text)))
    }
}
