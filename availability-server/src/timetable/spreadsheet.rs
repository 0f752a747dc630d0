//! Spreadsheet timetable extraction.
//!
//! A timetable worksheet looks roughly like this:
//!
//! ```text
//!   2025年7月 Field Timetable
//!   A  開放  Available              <- legend rows
//!   X  保養  Maintenance
//!   日期 Date | 1 | 2 | 3 | ...      <- date header row
//!   07:00 - 08:00 | A | X | ...     <- time rows, one status per day column
//!   08:00 - 09:00 |   | X | ...
//! ```
//!
//! Layouts vary between documents, so each step below is a separate
//! heuristic that degrades on its own instead of failing the whole parse.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::LazyLock;

use calamine::{Reader, SheetVisible, open_workbook_auto_from_rs};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{LegendMap, MonthYear, RecordSource, TimeLabel, Timetable, TimetableRecord};
use crate::download::Document;

use super::config::ExtractOptions;
use super::error::ExtractionError;
use super::legend::spreadsheet_legend;
use super::normalize::normalize_column;
use super::sheet::{Cell, Sheet};

static TIME_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}:\d{2})\s*[-–]\s*(\d{1,2}:\d{2})\s*$").expect("valid time row regex")
});
static YEAR_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<year>20\d{2})\s*(?:年|/|-)?\s*(?P<month>\d{1,2})\s*(?:月)?")
        .expect("valid year-month regex")
});
static MONTH_SLASH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<month>\d{1,2})\s*/\s*(?P<year>20\d{2})").expect("valid month/year regex")
});

/// How many leading rows are searched for a month/year title.
const TITLE_SCAN_ROWS: usize = 5;

/// Parse every relevant worksheet of a workbook into timetable records.
///
/// The workbook format (xlsx, xls, ods) is detected from the bytes.
pub fn extract_from_spreadsheet(
    document: &Document,
    month_year: MonthYear,
    options: &ExtractOptions,
) -> Result<Vec<TimetableRecord>, ExtractionError> {
    let sheets = load_sheets(&document.bytes)?;
    if sheets.is_empty() {
        return Err(ExtractionError::EmptyWorkbook {
            url: document.location.clone(),
        });
    }

    let records = extract_from_sheets(&sheets, month_year, options)
        .into_iter()
        .map(|(sheet, timetable, legend_map)| TimetableRecord {
            month_year,
            source: RecordSource::spreadsheet(&document.location),
            content_digest: document.digest.clone(),
            timetable,
            legend_map,
            section: Some(sheet.name.clone()),
            page: None,
        })
        .collect::<Vec<_>>();

    info!(
        url = %document.location,
        %month_year,
        records = records.len(),
        "parsed spreadsheet timetable"
    );
    Ok(records)
}

/// Read all worksheets of a workbook into memory.
pub fn load_sheets(bytes: &[u8]) -> Result<Vec<Sheet>, ExtractionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let listed: Vec<(String, bool)> = workbook
        .sheets_metadata()
        .iter()
        .map(|meta| (meta.name.clone(), matches!(meta.visible, SheetVisible::Visible)))
        .collect();

    let mut sheets = Vec::new();
    for (name, visible) in listed {
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                let sheet = Sheet::from_range(name, &range);
                sheets.push(if visible { sheet } else { sheet.hidden() });
            }
            Err(e) => warn!(sheet = %name, error = %e, "skipping unreadable worksheet"),
        }
    }
    Ok(sheets)
}

/// Select, disambiguate and parse the timetable sheets of a workbook.
pub fn extract_from_sheets<'a>(
    sheets: &'a [Sheet],
    month_year: MonthYear,
    options: &ExtractOptions,
) -> Vec<(&'a Sheet, Timetable, LegendMap)> {
    let candidates = select_sheets(sheets, &options.sheet_keywords);
    let candidates = drop_new_variants(sheets, candidates, &options.new_variant_marker);
    let chosen = disambiguate_month(sheets, candidates, month_year);

    chosen
        .into_iter()
        .map(|idx| {
            let sheet = &sheets[idx];
            debug!(sheet = %sheet.name, "parsing worksheet");
            let (timetable, legend) = parse_sheet(sheet, month_year, &options.date_header_marker);
            (sheet, timetable, legend)
        })
        .collect()
}

/// Indices of sheets whose name contains one of the keywords.
///
/// Falls back to the first visible sheet when nothing matches. calamine
/// does not report which tab was active when the workbook was saved, and
/// the active tab is always a visible one.
pub fn select_sheets(sheets: &[Sheet], keywords: &[String]) -> Vec<usize> {
    let matched: Vec<usize> = sheets
        .iter()
        .enumerate()
        .filter(|(_, s)| keywords.iter().any(|k| s.name.contains(k.as_str())))
        .map(|(i, _)| i)
        .collect();

    if matched.is_empty() && !sheets.is_empty() {
        let fallback = sheets.iter().position(|s| s.visible).unwrap_or(0);
        debug!(sheet = %sheets[fallback].name, "no sheet name matched the timetable keywords");
        return vec![fallback];
    }
    matched
}

/// Drop "(New)" variants that duplicate a base-named candidate.
///
/// A variant is dropped when another candidate has the same name without
/// the marker and both sheets detect the same month/year (or neither
/// detects one).
pub fn drop_new_variants(sheets: &[Sheet], candidates: Vec<usize>, marker: &str) -> Vec<usize> {
    let base_name = |idx: usize| sheets[idx].name.replace(marker, "").trim().to_string();

    let kept: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&idx| {
            let sheet = &sheets[idx];
            if !sheet.name.contains(marker) {
                return true;
            }
            let base = base_name(idx);
            let detected = detect_month_year(sheet);
            let duplicated = candidates.iter().any(|&other| {
                other != idx
                    && !sheets[other].name.contains(marker)
                    && base_name(other) == base
                    && detect_month_year(&sheets[other]) == detected
            });
            if duplicated {
                debug!(sheet = %sheet.name, "skipping duplicated (New) variant");
            }
            !duplicated
        })
        .collect();

    if kept.is_empty() { candidates } else { kept }
}

/// Keep only candidates whose detected month matches the request.
///
/// With a single candidate nothing is filtered. When no candidate matches,
/// all of them are kept.
pub fn disambiguate_month(
    sheets: &[Sheet],
    candidates: Vec<usize>,
    month_year: MonthYear,
) -> Vec<usize> {
    if candidates.len() <= 1 {
        return candidates;
    }

    let matched: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&idx| detect_month_year(&sheets[idx]) == Some(month_year))
        .collect();

    if matched.is_empty() {
        warn!(%month_year, "no worksheet matches the requested month; parsing all candidates");
        candidates
    } else {
        matched
    }
}

/// Detect a sheet's own month from its title rows, then from its name.
pub fn detect_month_year(sheet: &Sheet) -> Option<MonthYear> {
    (0..TITLE_SCAN_ROWS.min(sheet.row_count()))
        .flat_map(|r| sheet.row(r).iter())
        .filter_map(Cell::as_text)
        .find_map(month_year_in)
        .or_else(|| month_year_in(&sheet.name))
}

/// Find a month/year mention such as "2025年7月", "2025-07" or "7/2025".
pub fn month_year_in(text: &str) -> Option<MonthYear> {
    let from_caps = |caps: regex::Captures<'_>| {
        let year: i32 = caps["year"].parse().ok()?;
        let month: u32 = caps["month"].parse().ok()?;
        MonthYear::new(month, year)
    };

    YEAR_MONTH
        .captures(text)
        .and_then(from_caps)
        .or_else(|| MONTH_SLASH_YEAR.captures(text).and_then(from_caps))
}

/// The row whose first cell contains the date-header marker (default: 0).
pub fn find_header_row(sheet: &Sheet, marker: &str) -> usize {
    (0..sheet.row_count())
        .find(|&r| sheet.cell(r, 0).as_text().is_some_and(|s| s.contains(marker)))
        .unwrap_or(0)
}

/// Map day columns of the header row to days of the month.
///
/// Numeric cells and digit-only text give the day directly. Other cells
/// fall back to the column position, kept only when that day exists in
/// the month.
pub fn map_columns_to_days(
    sheet: &Sheet,
    header_row: usize,
    month_year: MonthYear,
) -> BTreeMap<usize, u32> {
    let mut col_day = BTreeMap::new();

    for col in 1..sheet.col_count() {
        match sheet.cell(header_row, col) {
            Cell::Number(n) if (1.0..32.0).contains(&n.trunc()) => {
                col_day.insert(col, n.trunc() as u32);
            }
            Cell::Text(s) if !s.trim().is_empty() && s.trim().bytes().all(|b| b.is_ascii_digit()) => {
                if let Ok(day) = s.trim().parse::<u32>()
                    && (1..=31).contains(&day)
                {
                    col_day.insert(col, day);
                }
            }
            _ => {
                let day = col as u32;
                if month_year.day(day).is_some() {
                    col_day.insert(col, day);
                }
            }
        }
    }

    col_day
}

/// Time rows below the header: the first matching row starts the block,
/// the first non-matching row after it ends it.
///
/// Returns (row index, start label) pairs.
pub fn find_time_rows(sheet: &Sheet, header_row: usize) -> Vec<(usize, TimeLabel)> {
    let label_of = |r: usize| -> Option<TimeLabel> {
        let text = sheet.cell(r, 0).as_text()?;
        let caps = TIME_ROW.captures(text)?;
        TimeLabel::parse(&caps[1]).ok()
    };

    let Some(first) = (header_row + 1..sheet.row_count()).find(|&r| label_of(r).is_some()) else {
        return Vec::new();
    };

    (first..sheet.row_count())
        .map_while(|r| label_of(r).map(|label| (r, label)))
        .collect()
}

/// Parse one worksheet into its timetable and legend.
///
/// A sheet without time rows yields an empty timetable.
pub fn parse_sheet(sheet: &Sheet, month_year: MonthYear, marker: &str) -> (Timetable, LegendMap) {
    let header_row = find_header_row(sheet, marker);
    let legend = spreadsheet_legend(sheet, header_row);

    let time_rows = find_time_rows(sheet, header_row);
    if time_rows.is_empty() {
        debug!(sheet = %sheet.name, "no time rows found");
        return (Timetable::new(), legend);
    }
    let labels: Vec<TimeLabel> = time_rows.iter().map(|(_, label)| *label).collect();

    let mut timetable = Timetable::new();
    for (col, day) in map_columns_to_days(sheet, header_row, month_year) {
        let Some(date) = month_year.day(day) else {
            continue;
        };

        let statuses: Vec<Option<String>> = time_rows
            .iter()
            .map(|(r, _)| sheet.cell(*r, col).value_string())
            .collect();

        if let Some(intervals) = normalize_column(&labels, statuses.iter().map(|s| s.as_deref())) {
            timetable.insert(date, intervals);
        }
    }

    debug!(sheet = %sheet.name, dates = timetable.len(), "parsed worksheet");
    (timetable, legend)
}
