use sha2::{Digest, Sha256};

/// A fetched source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// URL or path the bytes were read from.
    pub location: String,
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub digest: String,
}

impl Document {
    pub fn new(location: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = content_digest(&bytes);
        Self {
            location: location.into(),
            bytes,
            digest,
        }
    }
}

/// Lowercase hex SHA-256 of the content.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
