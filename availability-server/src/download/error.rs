//! Download error types.

/// Errors that can occur when fetching a source document.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Document does not exist at the location
    #[error("document not found: {location}")]
    NotFound { location: String },

    /// Local file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl DownloadError {
    /// Whether the document is simply missing (as opposed to unreachable).
    pub fn is_not_found(&self) -> bool {
        matches!(self, DownloadError::NotFound { .. })
    }
}
