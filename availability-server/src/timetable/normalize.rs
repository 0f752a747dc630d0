//! Interval normalization: merge same-status runs, then fill gaps.
//!
//! Both extractors read one raw interval per filled cell. A day column
//! becomes canonical by coalescing adjacent cells with the same status and
//! filling the untabulated stretches between the first and last row labels
//! with the default status.

use crate::domain::{CanonicalInterval, DEFAULT_STATUS, RawInterval, TimeLabel};

/// Coalesce adjacent raw intervals that share a status.
///
/// Scans left to right; an interval is folded into the previous one iff the
/// statuses are equal and `prev.end == cur.start`. Applying `merge` to its
/// own output changes nothing.
pub fn merge(raw: &[RawInterval]) -> Vec<RawInterval> {
    let mut merged: Vec<RawInterval> = Vec::with_capacity(raw.len());
    for itv in raw {
        match merged.last_mut() {
            Some(prev) if prev.status == itv.status && prev.end == itv.start => {
                prev.end = itv.end;
            }
            _ => merged.push(itv.clone()),
        }
    }
    merged
}

/// Fill the gaps around and between merged intervals.
///
/// The result starts at `first` and ends at `last` whenever the merged
/// intervals lie inside that span. An empty input yields a single
/// `[first, last)` interval with the default status.
pub fn fill_gaps(
    merged: &[RawInterval],
    first: TimeLabel,
    last: TimeLabel,
    default_status: &str,
) -> Vec<CanonicalInterval> {
    let (Some(head), Some(tail)) = (merged.first(), merged.last()) else {
        return vec![CanonicalInterval::new(first, last, default_status)];
    };

    let mut filled = Vec::with_capacity(merged.len() * 2 + 1);

    if head.start != first {
        filled.push(CanonicalInterval::new(first, head.start, default_status));
    }

    for (i, itv) in merged.iter().enumerate() {
        filled.push(CanonicalInterval::from(itv.clone()));
        if let Some(next) = merged.get(i + 1)
            && itv.end != next.start
        {
            filled.push(CanonicalInterval::new(itv.end, next.start, default_status));
        }
    }

    if tail.end != last {
        filled.push(CanonicalInterval::new(tail.end, last, default_status));
    }

    filled
}

/// Merge then fill with the default status "A".
pub fn normalize(raw: &[RawInterval], first: TimeLabel, last: TimeLabel) -> Vec<CanonicalInterval> {
    fill_gaps(&merge(raw), first, last, DEFAULT_STATUS)
}

/// Build raw intervals for one day column of a grid.
///
/// `labels[i]` is the start of row `i`; a row ends where the next begins, so
/// the last row only bounds the span. Empty statuses are skipped.
pub fn column_intervals<'a>(
    labels: &[TimeLabel],
    statuses: impl IntoIterator<Item = Option<&'a str>>,
) -> Vec<RawInterval> {
    statuses
        .into_iter()
        .enumerate()
        .filter_map(|(i, status)| {
            let status = status.map(str::trim).filter(|s| !s.is_empty())?;
            let start = *labels.get(i)?;
            let end = *labels.get(i + 1)?;
            Some(RawInterval::new(start, end, status))
        })
        .collect()
}

/// Normalize one day column: raw extraction, merge and gap fill.
///
/// Returns `None` when there are no row labels.
pub fn normalize_column<'a>(
    labels: &[TimeLabel],
    statuses: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<Vec<CanonicalInterval>> {
    let first = *labels.first()?;
    let last = *labels.last()?;
    let raw = column_intervals(labels, statuses);
    Some(normalize(&raw, first, last))
}
