//! Month/year identifiers for timetable documents.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid month/year string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month/year {input:?}: {reason}")]
pub struct InvalidMonthYear {
    input: String,
    reason: &'static str,
}

/// The calendar month a timetable covers, written "M/YYYY".
///
/// # Examples
///
/// ```
/// use availability_server::domain::MonthYear;
///
/// let my = MonthYear::parse("07/2025").unwrap();
/// assert_eq!(my.to_string(), "7/2025");
/// assert_eq!(my.month(), 7);
/// assert_eq!(my.year(), 2025);
///
/// assert!(MonthYear::parse("13/2025").is_err());
/// assert!(MonthYear::parse("July 2025").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    /// Create from components, validating the month.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Parse "M/YYYY", "MM/YYYY" or "M-YYYY" (whitespace tolerated).
    pub fn parse(s: &str) -> Result<Self, InvalidMonthYear> {
        let err = |reason| InvalidMonthYear {
            input: s.to_string(),
            reason,
        };

        let (month_part, year_part) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| err("expected M/YYYY"))?;
        let month_part = month_part.trim();
        let year_part = year_part.trim();

        if month_part.is_empty()
            || month_part.len() > 2
            || !month_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err("invalid month digits"));
        }
        if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err("year must be four digits"));
        }

        let month: u32 = month_part.parse().map_err(|_| err("invalid month"))?;
        let year: i32 = year_part.parse().map_err(|_| err("invalid year"))?;

        Self::new(month, year).ok_or_else(|| err("month must be 1-12"))
    }

    /// The month containing a date.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the month (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The date of `day` within this month, if it exists.
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// Whether a date falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for MonthYear {
    type Err = InvalidMonthYear;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MonthYear({}/{})", self.month, self.year)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MonthYear::parse(&s).map_err(serde::de::Error::custom)
    }
}
