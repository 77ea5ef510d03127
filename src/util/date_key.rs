use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Format a `(year, month)` pair as the 6-character storage key, e.g. `202503`.
pub fn format_date_key(year: i32, month: u32) -> String {
    format!("{:04}{:02}", year, month)
}

/// Parse a `YYYYMM` key back into `(year, month)`.
///
/// Returns `None` unless the key is exactly six ASCII digits naming a
/// nonzero year and a month in 1..=12.
pub fn parse_date_key(key: &str) -> Option<(i32, u32)> {
    if key.len() != 6 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = key[..4].parse().ok()?;
    let month: u32 = key[4..].parse().ok()?;
    if year == 0 || !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// A calendar month, the unit of storage and caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey {
    year: i32,
    month: u32,
}

impl DateKey {
    /// Build a key, rejecting anything `parse_date_key` would reject.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if year <= 0 || year > 9999 || !(1..=12).contains(&month) {
            return None;
        }
        Some(DateKey { year, month })
    }

    /// The month a timestamp falls in.
    pub fn of(time: &NaiveDateTime) -> Self {
        DateKey {
            year: time.year(),
            month: time.month(),
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        DateKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The month after this one, or `None` past December 9999.
    pub fn next(self) -> Option<DateKey> {
        if self.month == 12 {
            DateKey::new(self.year + 1, 1)
        } else {
            DateKey::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_date_key(self.year, self.month))
    }
}

/// Error for a string that is not a valid `YYYYMM` key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month key: {0:?} (expected YYYYMM)")]
pub struct InvalidDateKey(pub String);

impl FromStr for DateKey {
    type Err = InvalidDateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date_key(s)
            .and_then(|(year, month)| DateKey::new(year, month))
            .ok_or_else(|| InvalidDateKey(s.to_string()))
    }
}
