use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{FacilityId, TimeLabel};

use super::error::QueryError;

/// An availability request as received: every field is raw text.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(default, alias = "facility")]
    pub lcsdid: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    Point {
        facility: FacilityId,
        date: Option<NaiveDate>,
        time: Option<TimeLabel>,
    },
    Period {
        facility: FacilityId,
        date: Option<NaiveDate>,
        period: Period,
    },
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AvailabilityRequest {
    /// Validate the raw fields.
    pub fn parse(&self) -> Result<ParsedQuery, QueryError> {
        let facility = present(&self.lcsdid)
            .ok_or_else(|| QueryError::validation("parameter lcsdid is required"))?;
        let facility = FacilityId::parse(facility)
            .map_err(|e| QueryError::validation(e.to_string()))?;

        let time = present(&self.time);
        let period = present(&self.period);
        if time.is_some() && period.is_some() {
            return Err(QueryError::validation(
                "provide either time or period, not both",
            ));
        }

        let date = present(&self.date).map(parse_date).transpose()?;

        match period {
            Some(period) => Ok(ParsedQuery::Period {
                facility,
                date,
                period: Period::parse(period)?,
            }),
            None => Ok(ParsedQuery::Point {
                facility,
                date,
                time: time.map(parse_time).transpose()?,
            }),
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::validation(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}

fn parse_time(s: &str) -> Result<TimeLabel, QueryError> {
    TimeLabel::parse(s).map_err(|e| QueryError::validation(format!("{e} in {s:?}")))
}

/// A same-day time range `start-end` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: TimeLabel,
    end: TimeLabel,
}

impl Period {
    pub fn new(start: TimeLabel, end: TimeLabel) -> Result<Self, QueryError> {
        if start >= end {
            return Err(QueryError::validation(
                "period start must be earlier than end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse `HH:MM[:SS]-HH:MM[:SS]`.
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| QueryError::validation(format!("invalid period {s:?}, expected HH:MM-HH:MM")))?;
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> TimeLabel {
        self.start
    }

    /// Exclusive.
    pub fn end(&self) -> TimeLabel {
        self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
