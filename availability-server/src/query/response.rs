use serde::{Deserialize, Serialize};

/// Availability rendered as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    True,
    False,
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Availability::True
        } else {
            Availability::False
        }
    }
}

/// Echo of a point request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRequested {
    pub lcsdid: String,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub datetime_iso: String,
}

/// Answer to "is the facility available at this instant?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointResponse {
    pub timestamp_queried: String,
    pub facility_name: String,
    pub requested: PointRequested,
    pub status_letter: String,
    pub availability: Availability,
    pub legend: Option<String>,
}

/// One run of a period with a single status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySegment {
    /// `HH:MM:SS-HH:MM:SS`, both ends inclusive.
    pub time_range: String,
    pub status_letter: String,
    pub availability: Availability,
    pub legend: Option<String>,
}

/// Echo of a period request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRequested {
    pub lcsdid: String,
    pub date: String,
    pub period: String,
}

/// Answer to "how available is the facility over this period?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodResponse {
    pub timestamp_queried: String,
    pub facility_name: String,
    pub requested: PeriodRequested,
    pub segments: Vec<AvailabilitySegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AvailabilityResponse {
    Point(PointResponse),
    Period(PeriodResponse),
}
