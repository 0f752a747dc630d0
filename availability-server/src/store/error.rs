//! Store error types.

/// Errors from reading or writing stored documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored document could not be (de)serialized
    #[error("JSON error on {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A writer panicked while holding the store lock
    #[error("store lock poisoned")]
    Poisoned,
}
