//! Document retrieval.
//!
//! Timetables are published as spreadsheet and PDF files at stable URLs.
//! The downloader fetches them over HTTP(S), or from the local filesystem
//! for plain paths, and attaches a SHA-256 digest of the content so that
//! stored records can be traced back to the exact bytes they came from.

mod client;
mod document;
mod error;

pub use client::{DocumentDownloader, DocumentSource, DownloaderConfig};
pub use document::{Document, content_digest};
pub use error::DownloadError;
