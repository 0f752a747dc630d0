use thiserror::Error;

use crate::domain::{FacilityId, MonthYear};
use crate::store::StoreError;

/// Errors from availability queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request itself is malformed or out of range
    #[error("{0}")]
    Validation(String),

    /// Nothing has been harvested for the facility and month
    #[error("timetable not found for facility {facility} in {month_year}")]
    NotFound {
        facility: FacilityId,
        month_year: MonthYear,
    },

    /// Storage failed while looking up the timetable
    #[error("timetable lookup failed for {facility} in {month_year}: {source}")]
    Backend {
        facility: FacilityId,
        month_year: MonthYear,
        #[source]
        source: StoreError,
    },
}

impl QueryError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        QueryError::Validation(message.into())
    }
}
