//! PDF timetable extraction.
//!
//! Used when a facility publishes no workable spreadsheet. Each page's
//! text is parsed on its own; a page yields a record when it has at least
//! one time row of the form `07:00-08:00 A A X ...`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{LegendMap, MonthYear, RecordSource, TimeLabel, Timetable, TimetableRecord};
use crate::download::Document;

use super::error::ExtractionError;
use super::legend::{augment_l, pdf_legend};
use super::normalize::normalize_column;

static TIME_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}:\d{2})\s*[-–]\s*(\d{1,2}:\d{2})\s+(.*)$")
        .expect("valid pdf time row regex")
});
static SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(主場|副場|Main Field|Secondary Field)").expect("valid section title regex")
});

/// Characters of page text before the grid searched for a section title.
const BANNER_CHARS: usize = 160;

/// One parsed PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTimetable {
    /// Sub-facility label such as `MainField`, when the banner names one.
    pub section: Option<String>,
    pub timetable: Timetable,
    pub legend: LegendMap,
}

/// Parse every page of a PDF; pages without time rows are skipped.
///
/// Finding no timetable at all is an error, since the PDF is itself the
/// fallback for a missing spreadsheet.
pub fn extract_from_pdf(
    document: &Document,
    month_year: MonthYear,
) -> Result<Vec<TimetableRecord>, ExtractionError> {
    let pages = page_texts(document)?;

    let mut records = Vec::new();
    for (index, text) in pages.iter().enumerate() {
        let page_no = index as u32 + 1;
        let text = text.replace('\u{3000}', " ");
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

        let Some(page) = parse_page(&lines, month_year) else {
            debug!(page = page_no, "no time rows on page");
            continue;
        };

        records.push(TimetableRecord {
            month_year,
            source: RecordSource::pdf(&document.location),
            content_digest: document.digest.clone(),
            timetable: page.timetable,
            legend_map: page.legend,
            section: Some(page.section.unwrap_or_default()),
            page: Some(page_no),
        });
    }

    if records.is_empty() {
        return Err(ExtractionError::NoTimetable {
            url: document.location.clone(),
            month_year,
        });
    }

    info!(
        url = %document.location,
        %month_year,
        pages = records.len(),
        "parsed PDF timetable"
    );
    Ok(records)
}

/// Layout-preserving text of each page, in page order.
///
/// Text placed on one baseline comes out as one line with its cells
/// separated by spaces.
fn page_texts(document: &Document) -> Result<Vec<String>, ExtractionError> {
    // pdf_extract can panic on malformed PDFs
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&document.bytes)
    }));

    match result {
        Ok(pages) => Ok(pages?),
        Err(_) => {
            warn!(url = %document.location, "PDF text extraction panicked");
            Err(ExtractionError::PdfAborted {
                url: document.location.clone(),
            })
        }
    }
}

/// A time row: its start label and the per-day status tokens.
fn time_row(line: &str) -> Option<(TimeLabel, Vec<&str>)> {
    let caps = TIME_ROW.captures(line)?;
    let label = TimeLabel::parse(caps.get(1)?.as_str()).ok()?;
    let tokens: Vec<&str> = caps.get(3)?.as_str().split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    Some((label, tokens))
}

/// Parse the text lines of one page.
///
/// Returns `None` when the page has no time rows.
pub fn parse_page<S: AsRef<str>>(lines: &[S], month_year: MonthYear) -> Option<PageTimetable> {
    let is_time_row = |l: &S| time_row(l.as_ref()).is_some();
    let first = lines.iter().position(is_time_row)?;
    let last = lines.iter().rposition(is_time_row)?;

    let banner: String = lines[..first]
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(BANNER_CHARS)
        .collect();
    let section = SECTION_TITLE
        .find(&banner)
        .map(|m| m.as_str().replace(' ', ""));

    let mut legend = pdf_legend(&lines[..first]);

    let (labels, mut matrix): (Vec<TimeLabel>, Vec<Vec<&str>>) = lines[first..]
        .iter()
        .map_while(|l| time_row(l.as_ref()))
        .unzip();

    let width = matrix.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut matrix {
        row.resize(width, "");
    }

    let mut timetable = Timetable::new();
    for col in 0..width {
        let Some(date) = month_year.day(col as u32 + 1) else {
            continue;
        };
        if let Some(intervals) = normalize_column(&labels, matrix.iter().map(|row| Some(row[col])))
        {
            timetable.insert(date, intervals);
        }
    }

    augment_l(&lines[last + 1..], &mut legend);

    Some(PageTimetable {
        section,
        timetable,
        legend,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_text;
    use super::*;
    use crate::domain::CanonicalInterval;
    use chrono::NaiveDate;

    fn my(m: u32, y: i32) -> MonthYear {
        MonthYear::new(m, y).unwrap()
    }

    fn t(s: &str) -> TimeLabel {
        TimeLabel::parse(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn page_lines() -> Vec<&'static str> {
        vec![
            "康樂及文化事務署 運動場 主場 Main Field",
            "A 開放 Available",
            "X 保養 Maintenance",
            "L 緩跑徑 Jogging lane",
            "日期 Date 1 2 3",
            "07:00-08:00 A X L",
            "08:00-09:00 A X",
            "09:00-10:00 A A L",
            "10:00-11:00 A A A",
            "備註 Remarks",
            "為配合足球比賽，只開放第7及8號線道給公眾人士作緩跑之用。",
        ]
    }

    #[test]
    fn parses_page_grid() {
        let page = parse_page(&page_lines(), my(7, 2025)).unwrap();

        assert_eq!(page.section.as_deref(), Some("主場"));
        assert_eq!(page.timetable.len(), 3);
        assert_eq!(
            page.timetable[&date(1)],
            vec![CanonicalInterval::new(t("07:00"), t("10:00"), "A")]
        );
        assert_eq!(
            page.timetable[&date(2)],
            vec![
                CanonicalInterval::new(t("07:00"), t("09:00"), "X"),
                CanonicalInterval::new(t("09:00"), t("10:00"), "A"),
            ]
        );
        // padded empty token on the second row becomes a gap
        assert_eq!(
            page.timetable[&date(3)],
            vec![
                CanonicalInterval::new(t("07:00"), t("08:00"), "L"),
                CanonicalInterval::new(t("08:00"), t("09:00"), "A"),
                CanonicalInterval::new(t("09:00"), t("10:00"), "L"),
            ]
        );
    }

    #[test]
    fn legend_and_augmentation() {
        let page = parse_page(&page_lines(), my(7, 2025)).unwrap();
        assert_eq!(page.legend.describe("X"), Some("保養 Maintenance"));
        let l = page.legend.describe("L").unwrap();
        assert!(l.starts_with("緩跑徑 Jogging lane"));
        assert!(l.contains("號線道給公眾人士作緩跑之用。"));
    }

    #[test]
    fn english_section_title_loses_spaces() {
        let lines = ["Secondary Field Timetable", "07:00-08:00 X", "08:00-09:00 X"];
        let page = parse_page(&lines, my(7, 2025)).unwrap();
        assert_eq!(page.section.as_deref(), Some("SecondaryField"));
    }

    #[test]
    fn page_without_time_rows() {
        let lines = ["Cover page", "A Available"];
        assert!(parse_page(&lines, my(7, 2025)).is_none());
    }

    #[test]
    fn columns_beyond_month_end_are_skipped() {
        let row = format!("07:00-08:00 {}", vec!["X"; 31].join(" "));
        let lines = [row.as_str(), "08:00-09:00 X"];
        let page = parse_page(&lines, my(2, 2025)).unwrap();
        assert_eq!(page.timetable.len(), 28);
        assert!(page.section.is_none());
    }

    #[test]
    fn grid_ends_at_first_non_time_line() {
        let lines = [
            "07:00-08:00 X",
            "08:00-09:00 X",
            "Notes",
            "09:00-10:00 L",
        ];
        let page = parse_page(&lines, my(7, 2025)).unwrap();
        assert_eq!(
            page.timetable[&date(1)],
            vec![CanonicalInterval::new(t("07:00"), t("08:00"), "X")]
        );
    }

    #[test]
    fn time_rows_need_status_tokens() {
        let lines = ["07:00-08:00", "08:00-09:00", "09:00-10:00"];
        assert!(parse_page(&lines, my(7, 2025)).is_none());
    }

    #[test]
    fn reads_grid_drawn_cell_by_cell() {
        let mut cells = vec![
            (50, 800, "Main Field"),
            (50, 780, "A Available"),
            (50, 760, "X Maintenance"),
            (50, 740, "L Jogging lane"),
        ];
        let rows = [
            ("07:00-08:00", ["A", "X", "L"]),
            ("08:00-09:00", ["A", "X", "L"]),
            ("09:00-10:00", ["A", "A", "L"]),
            ("10:00-11:00", ["A", "A", "L"]),
        ];
        for (i, (label, statuses)) in rows.iter().enumerate() {
            let y = 700 - 20 * i as i64;
            cells.push((50, y, label));
            for (j, status) in statuses.iter().enumerate() {
                cells.push((150 + 30 * j as i64, y, status));
            }
        }
        cells.push((50, 600, "Jogging will be confined to lanes 7 and 8 during ball games."));

        let doc = Document::new("https://example.org/7.pdf", pdf_with_text(&cells));
        let records = extract_from_pdf(&doc, my(7, 2025)).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.page, Some(1));
        assert_eq!(record.section.as_deref(), Some("MainField"));
        assert_eq!(record.timetable.len(), 3);
        assert_eq!(
            record.timetable[&date(1)],
            vec![CanonicalInterval::new(t("07:00"), t("10:00"), "A")]
        );
        assert_eq!(
            record.timetable[&date(2)],
            vec![
                CanonicalInterval::new(t("07:00"), t("09:00"), "X"),
                CanonicalInterval::new(t("09:00"), t("10:00"), "A"),
            ]
        );
        assert_eq!(
            record.timetable[&date(3)],
            vec![CanonicalInterval::new(t("07:00"), t("10:00"), "L")]
        );
        assert_eq!(record.legend_map.describe("X"), Some("Maintenance"));
        assert!(record.legend_map.describe("L").unwrap().ends_with("during ball games."));

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["source"], "pdf");
        assert_eq!(json["pdf_url"], "https://example.org/7.pdf");
        assert_eq!(json["_sheet_name"], "MainField");
        assert_eq!(json["_page"], 1);
        assert_eq!(json["closure_detail"], serde_json::json!({}));
        assert_eq!(json["timetable"]["2025-07-02"][0]["status"], "X");
    }

    #[test]
    fn unreadable_pdf_is_an_error() {
        let doc = Document::new("mem://broken.pdf", b"%PDF-garbage".to_vec());
        assert!(matches!(
            extract_from_pdf(&doc, my(7, 2025)),
            Err(ExtractionError::Pdf(_) | ExtractionError::PdfAborted { .. })
        ));
    }

    #[test]
    fn pdf_without_timetable_pages_is_an_error() {
        let bytes = pdf_with_text(&[(100, 600, "Closed for renovation")]);
        let doc = Document::new("mem://notice.pdf", bytes);
        let err = extract_from_pdf(&doc, my(7, 2025)).unwrap_err();
        assert!(matches!(err, ExtractionError::NoTimetable { .. }));
    }

    #[test]
    fn page_without_section_writes_empty_sheet_name() {
        let bytes = pdf_with_text(&[
            (50, 700, "07:00-08:00"),
            (150, 700, "X"),
            (50, 680, "08:00-09:00"),
            (150, 680, "X"),
        ]);
        let doc = Document::new("mem://plain.pdf", bytes);
        let records = extract_from_pdf(&doc, my(7, 2025)).unwrap();

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["_sheet_name"], "");
        assert_eq!(json["timetable"]["2025-07-01"][0]["start"], "07:00");
    }
}
