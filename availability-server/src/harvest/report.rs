use serde::{Deserialize, Serialize};

/// Which kind of document a record or failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Excel,
    Pdf,
    Store,
}

/// One failed download, extraction or save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestFailure {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
    pub error: String,
}

/// Summary of a harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    /// When the run started, in the authority timezone.
    pub timestamp: String,
    #[serde(rename = "currentmonthdoc_excel_parsedsaved")]
    pub current_month_excel_saved: usize,
    #[serde(rename = "currentmonthdoc_pdf_parsedsaved")]
    pub current_month_pdf_saved: usize,
    #[serde(rename = "othermonthdoc_excel_parsedsaved")]
    pub other_month_excel_saved: usize,
    #[serde(rename = "othermonthdoc_pdf_parsedsaved")]
    pub other_month_pdf_saved: usize,
    #[serde(rename = "docs_excel_failed")]
    pub excel_failed: Vec<String>,
    #[serde(rename = "docs_pdf_failed")]
    pub pdf_failed: Vec<String>,
    pub errors: Vec<HarvestFailure>,
}

impl HarvestReport {
    /// Total records saved.
    pub fn saved(&self) -> usize {
        self.current_month_excel_saved
            + self.current_month_pdf_saved
            + self.other_month_excel_saved
            + self.other_month_pdf_saved
    }

    pub(crate) fn count_saved(&mut self, kind: SourceKind, current_month: bool, n: usize) {
        match (kind, current_month) {
            (SourceKind::Excel, true) => self.current_month_excel_saved += n,
            (SourceKind::Excel, false) => self.other_month_excel_saved += n,
            (SourceKind::Pdf, true) => self.current_month_pdf_saved += n,
            (SourceKind::Pdf, false) => self.other_month_pdf_saved += n,
            (SourceKind::Store, _) => {}
        }
    }

    pub(crate) fn record_failure(&mut self, kind: SourceKind, url: &str, error: impl ToString) {
        match kind {
            SourceKind::Excel => self.excel_failed.push(url.to_string()),
            SourceKind::Pdf => self.pdf_failed.push(url.to_string()),
            SourceKind::Store => {}
        }
        self.errors.push(HarvestFailure {
            kind,
            url: url.to_string(),
            error: error.to_string(),
        });
    }
}
