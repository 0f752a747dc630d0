//! Time intervals carrying a status code.

use serde::{Deserialize, Serialize};

use super::TimeLabel;

/// Default status for untabulated gaps inside the opening hours.
pub const DEFAULT_STATUS: &str = "A";

/// An interval as literally read from one cell (spreadsheet) or token (PDF).
///
/// Neighbouring raw intervals may be adjacent with the same status, or
/// leave gaps where cells were empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInterval {
    pub start: TimeLabel,
    pub end: TimeLabel,
    pub status: String,
}

impl RawInterval {
    pub fn new(start: TimeLabel, end: TimeLabel, status: impl Into<String>) -> Self {
        Self {
            start,
            end,
            status: status.into(),
        }
    }
}

/// A normalized interval: merged with same-status neighbours and part of a
/// gap-free, non-overlapping sequence for one date.
///
/// Persisted as `{"start": "HH:MM", "end": "HH:MM", "status": "A"}`. The end
/// is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInterval {
    pub start: TimeLabel,
    pub end: TimeLabel,
    pub status: String,
}

impl CanonicalInterval {
    pub fn new(start: TimeLabel, end: TimeLabel, status: impl Into<String>) -> Self {
        Self {
            start,
            end,
            status: status.into(),
        }
    }
}

impl From<RawInterval> for CanonicalInterval {
    fn from(raw: RawInterval) -> Self {
        Self {
            start: raw.start,
            end: raw.end,
            status: raw.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeLabel {
        TimeLabel::parse(s).unwrap()
    }

    #[test]
    fn persisted_shape() {
        let iv = CanonicalInterval::new(t("07:00"), t("08:00"), "X");
        let json = serde_json::to_value(&iv).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"start": "07:00", "end": "08:00", "status": "X"})
        );
    }
}
