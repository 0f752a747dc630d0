//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

/// Request to compact one month of stored timetables.
#[derive(Debug, Deserialize)]
pub struct CompactRequest {
    pub year: i32,

    /// 1-12
    pub month: u32,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
