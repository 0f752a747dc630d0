/// Options for spreadsheet sheet selection and layout detection.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Sheets whose name contains any of these are timetable candidates.
    pub sheet_keywords: Vec<String>,
    /// Text in the first cell of the date header row.
    pub date_header_marker: String,
    /// Name suffix of re-issued sheets.
    pub new_variant_marker: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sheet_keywords: vec!["Field Timetable".to_string(), "Jogging Timetable".to_string()],
            date_header_marker: "日期".to_string(),
            new_variant_marker: "(New)".to_string(),
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheet_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_header_marker(mut self, marker: impl Into<String>) -> Self {
        self.date_header_marker = marker.into();
        self
    }
}
