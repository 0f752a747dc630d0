//! Time-of-day handling for timetable grids and availability queries.
//!
//! Timetables label their rows with "HH:MM" strings (sometimes "H:MM"),
//! while queries may carry seconds ("HH:MM:SS"). Everything is compared as
//! seconds since midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A wall-clock time of day, stored as seconds since midnight.
///
/// # Examples
///
/// ```
/// use availability_server::domain::TimeLabel;
///
/// let t = TimeLabel::parse("7:30").unwrap();
/// assert_eq!(t.seconds(), 7 * 3600 + 30 * 60);
/// assert_eq!(t.to_string(), "07:30");
///
/// let t = TimeLabel::parse("18:00:15").unwrap();
/// assert_eq!(t.to_string(), "18:00:15");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeLabel(u32);

impl TimeLabel {
    /// Midnight.
    pub const MIDNIGHT: TimeLabel = TimeLabel(0);

    /// Create a label from seconds since midnight.
    ///
    /// Returns `None` for values beyond the end of the day.
    pub fn from_seconds(secs: u32) -> Option<Self> {
        (secs < SECONDS_PER_DAY).then_some(Self(secs))
    }

    /// Create a label from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 3600 + minute * 60))
    }

    /// Parse "H:MM", "HH:MM" or "HH:MM:SS".
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// ```
    /// use availability_server::domain::TimeLabel;
    ///
    /// assert!(TimeLabel::parse("00:00").is_ok());
    /// assert!(TimeLabel::parse("23:59:59").is_ok());
    /// assert!(TimeLabel::parse("1430").is_err());
    /// assert!(TimeLabel::parse("24:00").is_err());
    /// assert!(TimeLabel::parse("12:5").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let hour_part = parts.next().ok_or_else(|| TimeError::new("empty input"))?;
        let minute_part = parts
            .next()
            .ok_or_else(|| TimeError::new("expected H:MM format"))?;
        let second_part = parts.next();
        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }

        let hour = match hour_part.len() {
            1 => parse_one_digit(hour_part.as_bytes()[0]),
            2 => parse_two_digits(hour_part.as_bytes()),
            _ => None,
        }
        .ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(minute_part.as_bytes())
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = match second_part {
            None => 0,
            Some(sec) => {
                let second = parse_two_digits(sec.as_bytes())
                    .ok_or_else(|| TimeError::new("invalid second digits"))?;
                if second > 59 {
                    return Err(TimeError::new("second must be 0-59"));
                }
                second
            }
        };

        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    /// Seconds since midnight.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u32 {
        self.0 % 60
    }

    /// Always renders "HH:MM:SS", as used in period segment labels.
    pub fn to_hhmmss(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.hour(),
            self.minute(),
            self.second()
        )
    }

    /// Converts to a chrono time.
    pub fn to_naive_time(&self) -> NaiveTime {
        // in range by construction
        NaiveTime::from_num_seconds_from_midnight_opt(self.0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeLabel {
    fn from(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }
}

impl FromStr for TimeLabel {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeLabel({})", self.to_hhmmss())
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.second() == 0 {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        } else {
            f.write_str(&self.to_hhmmss())
        }
    }
}

impl Serialize for TimeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeLabel::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a single ASCII digit byte.
fn parse_one_digit(b: u8) -> Option<u32> {
    (b as char).to_digit(10)
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = parse_one_digit(bytes[0])?;
    let d2 = parse_one_digit(bytes[1])?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        let t = TimeLabel::parse("00:00").unwrap();
        assert_eq!(t.seconds(), 0);

        let t = TimeLabel::parse("7:05").unwrap();
        assert_eq!(t.hour(), 7);
        assert_eq!(t.minute(), 5);

        let t = TimeLabel::parse(" 23:59:59 ").unwrap();
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);
        assert_eq!(t.second(), 59);
    }

    #[test]
    fn parse_invalid_format() {
        assert!(TimeLabel::parse("").is_err());
        assert!(TimeLabel::parse("1430").is_err());
        assert!(TimeLabel::parse("14:3").is_err());
        assert!(TimeLabel::parse("14:300").is_err());
        assert!(TimeLabel::parse("143:00").is_err());
        assert!(TimeLabel::parse("14-30").is_err());
        assert!(TimeLabel::parse("ab:cd").is_err());
        assert!(TimeLabel::parse("12:00:00:00").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(TimeLabel::parse("24:00").is_err());
        assert!(TimeLabel::parse("12:60").is_err());
        assert!(TimeLabel::parse("12:00:60").is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(TimeLabel::parse("9:05").unwrap().to_string(), "09:05");
        assert_eq!(TimeLabel::parse("09:05:01").unwrap().to_string(), "09:05:01");
        assert_eq!(TimeLabel::parse("09:05").unwrap().to_hhmmss(), "09:05:00");
    }

    #[test]
    fn ordering_by_seconds() {
        let a = TimeLabel::parse("07:00").unwrap();
        let b = TimeLabel::parse("07:00:01").unwrap();
        let c = TimeLabel::parse("10:00").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn from_seconds_bounds() {
        assert!(TimeLabel::from_seconds(0).is_some());
        assert!(TimeLabel::from_seconds(SECONDS_PER_DAY - 1).is_some());
        assert!(TimeLabel::from_seconds(SECONDS_PER_DAY).is_none());
    }

    #[test]
    fn serde_as_string() {
        let t = TimeLabel::parse("08:00").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"08:00\"");

        let back: TimeLabel = serde_json::from_str("\"8:00\"").unwrap();
        assert_eq!(back, t);

        assert!(serde_json::from_str::<TimeLabel>("\"nope\"").is_err());
    }

    #[test]
    fn naive_time_conversion() {
        let nt = NaiveTime::from_hms_opt(18, 30, 5).unwrap();
        let t = TimeLabel::from(nt);
        assert_eq!(t.to_string(), "18:30:05");
        assert_eq!(t.to_naive_time(), nt);
    }
}
