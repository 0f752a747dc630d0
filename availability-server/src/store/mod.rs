//! Persisted timetable documents.
//!
//! Every harvest run writes one envelope per (facility, save date). Readers
//! want the most recently saved envelope for a facility and month, and a
//! separate compaction pass deletes the superseded ones.

mod error;
mod file;
mod memory;

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{FacilityId, FacilityTimetableDocument, MonthYear};

pub use error::StoreError;
pub use file::FileTimetableStore;
pub use memory::MemoryTimetableStore;

/// Default tag written into envelopes and ids.
pub const DEFAULT_TAG: &str = "af_timetable";

/// Where a document is saved: facility and save date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub facility: FacilityId,
    pub date: NaiveDate,
}

impl DocumentKey {
    pub fn new(facility: FacilityId, date: NaiveDate) -> Self {
        Self { facility, date }
    }

    pub fn month_year(&self) -> MonthYear {
        MonthYear::of(self.date)
    }

    /// Envelope id: `{tag}_{facility}_{year}_{month}_{day}`.
    pub fn id(&self, tag: &str) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            tag,
            self.facility,
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }
}

/// A stored document with its key fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub tag: String,
    pub facility_id: FacilityId,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub data: FacilityTimetableDocument,
}

impl StoredDocument {
    pub fn new(tag: &str, key: &DocumentKey, data: FacilityTimetableDocument) -> Self {
        Self {
            id: key.id(tag),
            tag: tag.to_string(),
            facility_id: key.facility.clone(),
            year: key.date.year(),
            month: key.date.month(),
            day: key.date.day(),
            data,
        }
    }

    pub fn month_year(&self) -> Option<MonthYear> {
        MonthYear::new(self.month, self.year)
    }
}

/// Outcome of a compaction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionReport {
    /// Envelopes found for the month
    pub loaded: usize,
    /// Superseded envelopes removed
    pub deleted: usize,
    /// Envelopes left, one per facility
    pub remaining: usize,
}

/// Storage for timetable envelopes.
///
/// Writers to the same key overwrite each other; the last write wins.
pub trait TimetableStore: Send + Sync {
    /// Insert or replace the envelope for `key`.
    fn upsert(
        &self,
        key: &DocumentKey,
        document: FacilityTimetableDocument,
    ) -> Result<StoredDocument, StoreError>;

    /// The envelope with the latest save day for a facility and month.
    fn query_latest(
        &self,
        facility: &FacilityId,
        month_year: MonthYear,
    ) -> Result<Option<StoredDocument>, StoreError>;

    /// Keep only the latest envelope per facility for the month.
    fn compact(&self, month_year: MonthYear) -> Result<CompactionReport, StoreError>;
}

impl<T: TimetableStore + ?Sized> TimetableStore for Arc<T> {
    fn upsert(
        &self,
        key: &DocumentKey,
        document: FacilityTimetableDocument,
    ) -> Result<StoredDocument, StoreError> {
        (**self).upsert(key, document)
    }

    fn query_latest(
        &self,
        facility: &FacilityId,
        month_year: MonthYear,
    ) -> Result<Option<StoredDocument>, StoreError> {
        (**self).query_latest(facility, month_year)
    }

    fn compact(&self, month_year: MonthYear) -> Result<CompactionReport, StoreError> {
        (**self).compact(month_year)
    }
}
