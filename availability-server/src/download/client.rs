//! HTTP and filesystem document downloader.

use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::debug;

use super::document::Document;
use super::error::DownloadError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default maximum concurrent downloads.
const DEFAULT_MAX_CONCURRENT: usize = 4;

const DEFAULT_USER_AGENT: &str = concat!("availability-server/", env!("CARGO_PKG_VERSION"));

/// Somewhere documents can be fetched from.
///
/// The harvester only needs bytes for a location; tests substitute an
/// in-memory source.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Document, DownloadError>> + Send;
}

/// Configuration for the document downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent downloads
    pub max_concurrent: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set maximum concurrent downloads.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

/// Fetches documents over HTTP(S) or from local paths.
///
/// A semaphore bounds concurrent requests to the publisher.
#[derive(Debug, Clone)]
pub struct DocumentDownloader {
    http: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl DocumentDownloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Fetch a document. `http://` and `https://` locations are downloaded;
    /// anything else (optionally prefixed `file://`) is read from disk.
    pub async fn download(&self, location: &str) -> Result<Document, DownloadError> {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            self.download_http(location).await
        } else {
            read_local(location).await
        }
    }

    async fn download_http(&self, url: &str) -> Result<Document, DownloadError> {
        // the semaphore is never closed, so acquire cannot fail in practice
        let _permit = self.semaphore.acquire().await.ok();

        let http_err = |source| DownloadError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(http_err)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound {
                location: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_err)?;
        debug!(url, size = bytes.len(), "downloaded document");
        Ok(Document::new(url, bytes.to_vec()))
    }
}

impl DocumentSource for DocumentDownloader {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Document, DownloadError>> + Send {
        self.download(location)
    }
}

async fn read_local(location: &str) -> Result<Document, DownloadError> {
    let path = location.strip_prefix("file://").unwrap_or(location);
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!(path, size = bytes.len(), "read local document");
            Ok(Document::new(location, bytes))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DownloadError::NotFound {
            location: location.to_string(),
        }),
        Err(source) => Err(DownloadError::Io {
            path: path.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::content_digest;
    use tempfile::tempdir;

    #[test]
    fn config_builder() {
        let config = DownloaderConfig::new()
            .with_timeout(5)
            .with_max_concurrent(0)
            .with_user_agent("probe/1.0");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.user_agent, "probe/1.0");
    }

    #[tokio::test]
    async fn reads_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timetable.pdf");
        std::fs::write(&path, b"abc").unwrap();

        let downloader = DocumentDownloader::new(DownloaderConfig::default()).unwrap();
        let location = path.to_string_lossy().to_string();
        let doc = downloader.download(&location).await.unwrap();

        assert_eq!(doc.bytes, b"abc");
        assert_eq!(doc.digest, content_digest(b"abc"));
        assert_eq!(doc.location, location);

        let prefixed = format!("file://{location}");
        let doc = downloader.fetch(&prefixed).await.unwrap();
        assert_eq!(doc.bytes, b"abc");
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");

        let downloader = DocumentDownloader::new(DownloaderConfig::default()).unwrap();
        let err = downloader
            .download(&path.to_string_lossy())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
