//! Point lookup and period slicing over one day's intervals.
//!
//! Canonical intervals are half-open `[start, end)` on minute labels. Queries
//! work on closed second ranges instead: an interval covers
//! `[start, end - 1s]` and a period `a-b` covers `[a, b - 1s]`, so that
//! segment labels read `07:00:00-07:59:59`.

use crate::domain::CanonicalInterval;

/// A tabulated interval as a closed range of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondRange<'a> {
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    pub status: &'a str,
}

/// Whether a slice of a period is covered by the timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceStatus<'a> {
    /// Outside every tabulated interval.
    Closed,
    Status(&'a str),
}

/// One maximal run of a period with a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice<'a> {
    pub start: u32,
    /// Inclusive.
    pub end: u32,
    pub status: SliceStatus<'a>,
}

/// Convert a day's intervals to closed second ranges, sorted by start.
///
/// Zero-length intervals are dropped.
pub fn closed_ranges(intervals: &[CanonicalInterval]) -> Vec<SecondRange<'_>> {
    let mut ranges: Vec<SecondRange<'_>> = intervals
        .iter()
        .filter(|itv| itv.end > itv.start)
        .map(|itv| SecondRange {
            start: itv.start.seconds(),
            end: itv.end.seconds() - 1,
            status: itv.status.as_str(),
        })
        .collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Status of the range containing `t`, if any.
pub fn status_at<'a>(ranges: &[SecondRange<'a>], t: u32) -> Option<&'a str> {
    ranges
        .iter()
        .find(|r| r.start <= t && t <= r.end)
        .map(|r| r.status)
}

/// Slice the closed range `[q_start, q_end]` against sorted ranges.
///
/// Uncovered stretches become `Closed` slices; covered ones are clipped to
/// the query. Adjacent slices with the same status are merged, so the
/// result partitions the query range and no two neighbours share a status.
/// Returns an empty list when `q_start > q_end`.
pub fn slice_period<'a>(ranges: &[SecondRange<'a>], q_start: u32, q_end: u32) -> Vec<Slice<'a>> {
    let mut slices: Vec<Slice<'a>> = Vec::new();
    let mut i = 0;
    let mut cur = q_start;

    while cur <= q_end {
        while i < ranges.len() && ranges[i].end < cur {
            i += 1;
        }

        let (end, status) = match ranges.get(i) {
            Some(r) if r.start <= cur => (r.end.min(q_end), SliceStatus::Status(r.status)),
            // r.start > cur >= 0
            Some(r) => ((r.start - 1).min(q_end), SliceStatus::Closed),
            None => (q_end, SliceStatus::Closed),
        };

        match slices.last_mut() {
            Some(prev) if prev.status == status && prev.end + 1 == cur => prev.end = end,
            _ => slices.push(Slice {
                start: cur,
                end,
                status,
            }),
        }

        if end >= q_end {
            break;
        }
        cur = end + 1;
    }

    slices
}

/// `HH:MM:SS` for seconds since midnight.
pub fn hhmmss(secs: u32) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// `HH:MM:SS-HH:MM:SS` label for a closed range.
pub fn range_label(start: u32, end: u32) -> String {
    format!("{}-{}", hhmmss(start), hhmmss(end))
}
