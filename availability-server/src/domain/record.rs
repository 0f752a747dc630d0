//! Timetable records and the persisted facility document.
//!
//! Field names here are an interchange format shared with other consumers
//! of the stored documents, so serde renames keep the historic keys
//! (`excel_url`, `pdf_url`, `sha256`, `lcsd_number`, `_sheet_name`, ...).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::{CanonicalInterval, FacilityId, MonthYear};

/// Canonical intervals per date, keyed "YYYY-MM-DD" when serialized.
pub type Timetable = BTreeMap<NaiveDate, Vec<CanonicalInterval>>;

/// Status code → description, built per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegendMap(BTreeMap<String, String>);

impl LegendMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Description of a status code. Unknown codes have none.
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, code: impl Into<String>, description: impl Into<String>) {
        self.0.insert(code.into(), description.into());
    }

    /// Insert only if the code has no entry yet. Returns whether it was added.
    pub fn insert_first(&mut self, code: &str, description: impl Into<String>) -> bool {
        if self.0.contains_key(code) {
            return false;
        }
        self.0.insert(code.to_string(), description.into());
        true
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut String> {
        self.0.get_mut(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LegendMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The `"source": "pdf"` marker carried by PDF records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfSourceTag {
    #[default]
    Pdf,
}

/// Which extractor produced a record, and from where.
///
/// The key name carries the kind: spreadsheet records store `excel_url`,
/// PDF records store `source: "pdf"`, `pdf_url` and `closure_detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordSource {
    Spreadsheet {
        excel_url: String,
    },
    Pdf {
        #[serde(default)]
        source: PdfSourceTag,
        pdf_url: String,
        /// Closure notes keyed by date, as written by other harvesters.
        /// Kept verbatim; this extractor writes an empty object.
        #[serde(default)]
        closure_detail: serde_json::Map<String, serde_json::Value>,
    },
}

impl RecordSource {
    pub fn spreadsheet(url: impl Into<String>) -> Self {
        RecordSource::Spreadsheet {
            excel_url: url.into(),
        }
    }

    pub fn pdf(url: impl Into<String>) -> Self {
        RecordSource::Pdf {
            source: PdfSourceTag::Pdf,
            pdf_url: url.into(),
            closure_detail: serde_json::Map::new(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RecordSource::Spreadsheet { excel_url } => excel_url,
            RecordSource::Pdf { pdf_url, .. } => pdf_url,
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, RecordSource::Pdf { .. })
    }
}

/// One parsed worksheet or PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableRecord {
    pub month_year: MonthYear,

    #[serde(flatten)]
    pub source: RecordSource,

    /// SHA-256 of the source document bytes (lowercase hex).
    #[serde(rename = "sha256", default)]
    pub content_digest: String,

    #[serde(deserialize_with = "lenient_timetable")]
    pub timetable: Timetable,

    #[serde(default)]
    pub legend_map: LegendMap,

    /// Worksheet name or detected sub-facility section of a PDF page.
    #[serde(rename = "_sheet_name", default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// 1-based PDF page number.
    #[serde(rename = "_page", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl TimetableRecord {
    /// Intervals for one date; empty when the date is not tabulated.
    pub fn intervals_for(&self, date: NaiveDate) -> &[CanonicalInterval] {
        self.timetable.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any date carries intervals.
    pub fn has_timetable(&self) -> bool {
        self.timetable.values().any(|v| !v.is_empty())
    }
}

/// Read a stored timetable, dropping dates and intervals that do not parse.
///
/// Stored documents are also written by other programs; one bad interval
/// must not make the rest of the month unreadable.
fn lenient_timetable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timetable, D::Error> {
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

    let mut timetable = Timetable::new();
    for (day, intervals) in raw {
        let Ok(date) = NaiveDate::parse_from_str(&day, "%Y-%m-%d") else {
            debug!(day = %day, "skipping unparseable timetable date");
            continue;
        };
        let serde_json::Value::Array(items) = intervals else {
            debug!(day = %day, "skipping non-list timetable entry");
            continue;
        };
        let parsed = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<CanonicalInterval>(item) {
                Ok(interval) => Some(interval),
                Err(e) => {
                    debug!(day = %day, error = %e, "skipping unparseable interval");
                    None
                }
            })
            .collect();
        timetable.insert(date, parsed);
    }

    Ok(timetable)
}

/// Facility details attached to every stored timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_number: Option<String>,

    #[serde(rename = "lcsd_number")]
    pub facility_id: FacilityId,

    #[serde(default)]
    pub name: String,
}

/// The persisted unit: facility details flattened together with one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTimetableDocument {
    #[serde(flatten)]
    pub facility: FacilityInfo,

    #[serde(flatten)]
    pub record: TimetableRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeLabel;

    fn t(s: &str) -> TimeLabel {
        TimeLabel::parse(s).unwrap()
    }

    fn sample_record(source: RecordSource) -> TimetableRecord {
        let date = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let mut timetable = Timetable::new();
        timetable.insert(
            date,
            vec![
                CanonicalInterval::new(t("07:00"), t("08:00"), "A"),
                CanonicalInterval::new(t("08:00"), t("22:00"), "X"),
            ],
        );
        TimetableRecord {
            month_year: MonthYear::new(7, 2025).unwrap(),
            source,
            content_digest: "abc".to_string(),
            timetable,
            legend_map: [("X", "Maintenance")].into_iter().collect(),
            section: None,
            page: None,
        }
    }

    #[test]
    fn legend_lookup() {
        let legend: LegendMap = [("A", "Available")].into_iter().collect();
        assert_eq!(legend.describe("A"), Some("Available"));
        assert_eq!(legend.describe("Z"), None);
    }

    #[test]
    fn legend_insert_first_keeps_original() {
        let mut legend = LegendMap::new();
        assert!(legend.insert_first("A", "Available"));
        assert!(!legend.insert_first("A", "Something else"));
        assert_eq!(legend.describe("A"), Some("Available"));
    }

    #[test]
    fn spreadsheet_record_shape() {
        let record = sample_record(RecordSource::spreadsheet("https://example.org/t.xlsx"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["month_year"], "7/2025");
        assert_eq!(json["excel_url"], "https://example.org/t.xlsx");
        assert_eq!(json["sha256"], "abc");
        assert_eq!(json["timetable"]["2025-07-10"][1]["status"], "X");
        assert_eq!(json["legend_map"]["X"], "Maintenance");
        assert!(json.get("_page").is_none());
        assert!(json.get("pdf_url").is_none());
    }

    #[test]
    fn pdf_record_shape_and_roundtrip() {
        let mut record = sample_record(RecordSource::pdf("https://example.org/t.pdf"));
        record.section = Some("MainField".to_string());
        record.page = Some(2);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "pdf");
        assert_eq!(json["pdf_url"], "https://example.org/t.pdf");
        assert_eq!(json["closure_detail"], serde_json::json!({}));
        assert_eq!(json["_sheet_name"], "MainField");
        assert_eq!(json["_page"], 2);
        assert!(json.get("excel_url").is_none());

        let back: TimetableRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert!(back.source.is_pdf());
    }

    #[test]
    fn pdf_record_keeps_closure_detail() {
        let json = serde_json::json!({
            "source": "pdf",
            "month_year": "7/2025",
            "pdf_url": "u.pdf",
            "timetable": {},
            "closure_detail": {"2025-07-12": "Closed for a school sports day"}
        });
        let record: TimetableRecord = serde_json::from_value(json).unwrap();
        let RecordSource::Pdf { closure_detail, .. } = &record.source else {
            panic!("expected a PDF source");
        };
        assert_eq!(closure_detail.len(), 1);
        assert_eq!(
            serde_json::to_value(&record).unwrap()["closure_detail"]["2025-07-12"],
            "Closed for a school sports day"
        );
    }

    #[test]
    fn unparseable_intervals_are_dropped() {
        let json = serde_json::json!({
            "month_year": "7/2025",
            "excel_url": "u",
            "timetable": {
                "2025-07-10": [{"start": "07:00", "end": "22:00", "status": "A"}],
                "2025-07-11": [
                    {"start": "07:00", "end": "12:00", "status": "X"},
                    {"start": "12:00", "end": "24:00", "status": "A"}
                ],
                "2025-07-12": "closed",
                "someday": []
            }
        });
        let record: TimetableRecord = serde_json::from_value(json).unwrap();

        let tenth = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let eleventh = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
        assert_eq!(record.timetable.len(), 2);
        assert_eq!(
            record.intervals_for(tenth),
            [CanonicalInterval::new(t("07:00"), t("22:00"), "A")]
        );
        assert_eq!(
            record.intervals_for(eleventh),
            [CanonicalInterval::new(t("07:00"), t("12:00"), "X")]
        );
    }

    #[test]
    fn document_flattens_facility_and_record() {
        let doc = FacilityTimetableDocument {
            facility: FacilityInfo {
                did_number: Some("D1".to_string()),
                facility_id: FacilityId::parse("1060a").unwrap(),
                name: "Sports Ground".to_string(),
            },
            record: sample_record(RecordSource::spreadsheet("u")),
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["lcsd_number"], "1060a");
        assert_eq!(json["name"], "Sports Ground");
        assert_eq!(json["excel_url"], "u");

        let back: FacilityTimetableDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn legacy_record_without_digest_loads() {
        let json = serde_json::json!({
            "month_year": "6/2025",
            "excel_url": "u",
            "timetable": {"2025-06-01": [{"start": "07:00", "end": "22:00", "status": "A"}]},
            "legend_map": {}
        });
        let record: TimetableRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.content_digest, "");
        assert!(record.has_timetable());
    }

    #[test]
    fn intervals_for_missing_date_is_empty() {
        let record = sample_record(RecordSource::spreadsheet("u"));
        let other = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
        assert!(record.intervals_for(other).is_empty());
    }
}
