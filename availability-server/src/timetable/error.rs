use thiserror::Error;

use crate::domain::MonthYear;

/// Errors from turning a downloaded document into timetable records.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook {url} has no readable worksheets")]
    EmptyWorkbook { url: String },

    #[error("failed to read PDF: {0}")]
    Pdf(#[from] pdf_extract::OutputError),

    #[error("failed to read PDF {url}: text extraction aborted")]
    PdfAborted { url: String },

    #[error("no timetable page found in {url} for {month_year}")]
    NoTimetable { url: String, month_year: MonthYear },
}
