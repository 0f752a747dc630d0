//! Legend extraction: status code → description.
//!
//! Timetables explain their single-letter status codes in a block above the
//! grid. Spreadsheets put the code and its description in separate cells of
//! one row; PDF text puts them on one line.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::LegendMap;

use super::sheet::Sheet;

static CODE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]$").expect("valid code cell regex"));
static CID_ARTEFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(cid:\d+\)").expect("valid cid regex"));
static CALENDAR_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*日期\s+Date").expect("valid calendar start regex"));
static LEGEND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z])(?:\s*[：:]\s*|\s+)(\S.*)$").expect("valid legend line regex")
});
static DAY_TRAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+\d{1,2})+\s*$").expect("valid day trail regex"));
static HEADER_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(Sports\s+Ground|Opening\s+Hour)").expect("valid header noise regex")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static L_NOTE_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"為配合[^\n]+?號線道給公眾人士作緩跑之用。").expect("valid zh note regex")
});
static L_NOTE_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Jogging will be confined[^\n]+?ball games\.").expect("valid en note regex")
});

/// Marker that the verbose lane note is already part of the `L` description.
const L_NOTE_MARKER: &str = "為配合";

/// Legend from the rows above a spreadsheet's date header.
///
/// In each row the first cell holding exactly one uppercase letter starts
/// an entry; the non-empty cells after it, joined by single spaces, form
/// the description. Rows without a description are ignored.
pub fn spreadsheet_legend(sheet: &Sheet, header_row: usize) -> LegendMap {
    let mut legend = LegendMap::new();

    for r in 0..header_row.min(sheet.row_count()) {
        let cells = sheet.row(r);
        let Some(code_col) = cells.iter().position(|c| {
            c.as_text()
                .is_some_and(|s| CODE_CELL.is_match(s.trim()))
        }) else {
            continue;
        };

        let description = cells[code_col + 1..]
            .iter()
            .filter_map(|c| c.value_string())
            .collect::<Vec<_>>()
            .join(" ");

        if !description.is_empty() {
            let code = cells[code_col].as_text().unwrap_or_default().trim();
            legend.insert(code, description);
        }
    }

    legend
}

/// Legend from the PDF lines preceding the first time row.
///
/// A line `<letter> <description>` (or `<letter>: <description>`) defines an
/// entry and the first definition of a code wins. Scanning stops at the
/// calendar header. Glyph artefacts, trailing day-number runs and page
/// header noise are stripped.
pub fn pdf_legend<S: AsRef<str>>(lines: &[S]) -> LegendMap {
    let mut legend = LegendMap::new();

    for line in lines {
        let cleaned = CID_ARTEFACT.replace_all(line.as_ref(), "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        if CALENDAR_START.is_match(cleaned) {
            break;
        }

        let Some(caps) = LEGEND_LINE.captures(cleaned) else {
            continue;
        };
        let code = &caps[1];
        let description = clean_description(&caps[2]);

        if !description.is_empty() && !HEADER_NOISE.is_match(&description) {
            legend.insert_first(code, description);
        }
    }

    legend
}

fn clean_description(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw, " ");
    let trimmed = DAY_TRAIL.replace(&collapsed, "");
    trimmed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '：' | ':' | '.' | '-'))
        .to_string()
}

/// Append the verbose jogging-lane note to the `L` description.
///
/// Some documents keep the full explanation of code `L` in a paragraph
/// below the grid, in Chinese and English. When `L` is defined and does not
/// already carry the note, any matching sentences found in `trailing_lines`
/// are appended.
pub fn augment_l<S: AsRef<str>>(trailing_lines: &[S], legend: &mut LegendMap) {
    let Some(description) = legend.get_mut("L") else {
        return;
    };
    if description.contains(L_NOTE_MARKER) {
        return;
    }

    let text = trailing_lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");

    let notes: Vec<&str> = [&*L_NOTE_ZH, &*L_NOTE_EN]
        .iter()
        .filter_map(|re| re.find(&text).map(|m| m.as_str()))
        .collect();

    if notes.is_empty() {
        return;
    }

    let appended = std::iter::once(description.as_str())
        .chain(notes)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    *description = appended;
}
