//! Availability queries over stored timetables.
//!
//! A query names a facility, an optional date (default: today in the
//! authority timezone) and either an instant or a same-day period. Only the
//! current and the next month can be queried.

mod clock;
mod config;
mod engine;
mod error;
mod request;
mod response;
pub mod slice;

pub use clock::{Clock, DEFAULT_UTC_OFFSET_SECS, FixedClock, SystemClock};
pub use config::{CLOSED_STATUS, DEFAULT_AVAILABLE_CODES, DEFAULT_CLOSED_LEGEND, QueryConfig};
pub use engine::AvailabilityQueryEngine;
pub use error::QueryError;
pub use request::{AvailabilityRequest, ParsedQuery, Period, parse_date};
pub use response::{
    Availability, AvailabilityResponse, AvailabilitySegment, PeriodRequested, PeriodResponse,
    PointRequested, PointResponse,
};
