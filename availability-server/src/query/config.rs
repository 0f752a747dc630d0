use std::collections::BTreeSet;

use super::clock::DEFAULT_UTC_OFFSET_SECS;

/// Status codes that count as available unless configured otherwise.
pub const DEFAULT_AVAILABLE_CODES: [&str; 5] = ["A", "L", "G", "T", "F"];

/// Legend reported for instants outside every tabulated interval.
pub const DEFAULT_CLOSED_LEGEND: &str = "運動場關閉時間";

/// Status letter reported for instants outside every tabulated interval.
pub const CLOSED_STATUS: &str = "closed";

/// Configuration for availability queries.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Status codes reported as available.
    pub available_codes: BTreeSet<String>,
    /// Legend for the synthetic `closed` status.
    pub closed_legend: String,
    /// Authority timezone as seconds east of UTC.
    pub utc_offset_secs: i32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            available_codes: DEFAULT_AVAILABLE_CODES.iter().map(|c| c.to_string()).collect(),
            closed_legend: DEFAULT_CLOSED_LEGEND.to_string(),
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of available status codes.
    pub fn with_available_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_closed_legend(mut self, legend: impl Into<String>) -> Self {
        self.closed_legend = legend.into();
        self
    }

    pub fn with_utc_offset_secs(mut self, secs: i32) -> Self {
        self.utc_offset_secs = secs;
        self
    }

    pub fn is_available(&self, status: &str) -> bool {
        self.available_codes.contains(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allow_list() {
        let config = QueryConfig::default();
        for code in ["A", "L", "G", "T", "F"] {
            assert!(config.is_available(code));
        }
        assert!(!config.is_available("X"));
        assert!(!config.is_available("closed"));
        assert_eq!(config.utc_offset_secs, 28_800);
    }

    #[test]
    fn custom_allow_list() {
        let config = QueryConfig::new().with_available_codes(["A"]);
        assert!(config.is_available("A"));
        assert!(!config.is_available("L"));
    }
}
