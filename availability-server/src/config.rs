//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::query::DEFAULT_UTC_OFFSET_SECS;
use crate::store::DEFAULT_TAG;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 15;

/// Error returned when an environment variable holds an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    var: &'static str,
    value: String,
    reason: &'static str,
}

/// Process-level settings for the availability server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding one JSON file per stored document.
    pub data_dir: PathBuf,
    pub store_tag: String,
    /// Offset of the authority timezone from UTC.
    pub utc_offset_secs: i32,
    pub download_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            store_tag: DEFAULT_TAG.to_string(),
            utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Read `BIND_ADDR`, `DATA_DIR`, `STORE_TAG`,
    /// `AUTHORITY_UTC_OFFSET_SECS` and `DOWNLOAD_TIMEOUT_SECS`.
    ///
    /// Unset or empty variables take their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let invalid = |var: &'static str, value: &str, reason: &'static str| ConfigError {
            var,
            value: value.to_string(),
            reason,
        };

        let mut config = Self::default();

        if let Some(v) = get("BIND_ADDR") {
            config.bind_addr = v
                .parse()
                .map_err(|_| invalid("BIND_ADDR", &v, "expected host:port"))?;
        }
        if let Some(v) = get("DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("STORE_TAG") {
            if v.contains(['/', '\\', '.']) {
                return Err(invalid("STORE_TAG", &v, "must not contain '.' or path separators"));
            }
            config.store_tag = v;
        }
        if let Some(v) = get("AUTHORITY_UTC_OFFSET_SECS") {
            config.utc_offset_secs = v
                .parse()
                .ok()
                .filter(|secs: &i32| secs.abs() < 86_400)
                .ok_or_else(|| invalid("AUTHORITY_UTC_OFFSET_SECS", &v, "expected seconds within a day"))?;
        }
        if let Some(v) = get("DOWNLOAD_TIMEOUT_SECS") {
            config.download_timeout_secs = v
                .parse()
                .ok()
                .filter(|secs: &u64| *secs > 0)
                .ok_or_else(|| invalid("DOWNLOAD_TIMEOUT_SECS", &v, "expected a positive integer"))?;
        }

        Ok(config)
    }
}
