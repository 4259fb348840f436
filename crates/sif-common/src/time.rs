//! Time handling for satellite granule dates.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month, the averaging window for gridded products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    /// 1-based month number
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, TimeParseError> {
        if !(1..=12).contains(&month) {
            return Err(TimeParseError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Parse "YYYY-MM".
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| TimeParseError::InvalidFormat(s.to_string()))?;
        let year = y
            .parse()
            .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))?;
        let month = m
            .parse()
            .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated at construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.expect("validated at construction") - Duration::days(1)
    }

    /// The inclusive date range covering this month.
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.first_day(), self.last_day())
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Iterate the dates in the range, inclusive on both ends.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let days = (self.end - self.start).num_days().max(-1);
        (0..=days).map(move |d| start + Duration::days(d))
    }

    /// Clamp this range to another, returning None when disjoint.
    pub fn clamp_to(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(DateRange::new(start, end))
        } else {
            None
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid month number: {0}")]
    InvalidMonth(u32),
}
