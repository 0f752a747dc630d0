//! Timetable extraction from spreadsheet and PDF documents.
//!
//! Both extractors produce the same record shape: a date-keyed map of
//! canonical intervals plus a legend. The layout heuristics and the
//! normalizer are pure functions; only workbook and PDF decoding touch
//! third-party parsers.

mod config;
mod error;
pub mod legend;
pub mod normalize;
pub mod pdf;
pub mod sheet;
pub mod spreadsheet;

pub use config::ExtractOptions;
pub use error::ExtractionError;
pub use pdf::extract_from_pdf;
pub use spreadsheet::extract_from_spreadsheet;
