//! In-memory store.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::Datelike;

use crate::domain::{FacilityId, FacilityTimetableDocument, MonthYear};

use super::error::StoreError;
use super::{CompactionReport, DEFAULT_TAG, DocumentKey, StoredDocument, TimetableStore};

/// Envelopes of one facility and month, ordered by save day.
type DayMap = BTreeMap<u32, StoredDocument>;

/// Process-local store, used by tests and as a scratch backend.
#[derive(Debug)]
pub struct MemoryTimetableStore {
    tag: String,
    arena: RwLock<HashMap<(FacilityId, MonthYear), DayMap>>,
}

impl Default for MemoryTimetableStore {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl MemoryTimetableStore {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            arena: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored envelopes.
    pub fn len(&self) -> usize {
        self.arena
            .read()
            .map(|arena| arena.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimetableStore for MemoryTimetableStore {
    fn upsert(
        &self,
        key: &DocumentKey,
        document: FacilityTimetableDocument,
    ) -> Result<StoredDocument, StoreError> {
        let stored = StoredDocument::new(&self.tag, key, document);
        let mut arena = self.arena.write().map_err(|_| StoreError::Poisoned)?;
        arena
            .entry((key.facility.clone(), key.month_year()))
            .or_default()
            .insert(key.date.day(), stored.clone());
        Ok(stored)
    }

    fn query_latest(
        &self,
        facility: &FacilityId,
        month_year: MonthYear,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let arena = self.arena.read().map_err(|_| StoreError::Poisoned)?;
        Ok(arena
            .get(&(facility.clone(), month_year))
            .and_then(|days| days.values().next_back())
            .cloned())
    }

    fn compact(&self, month_year: MonthYear) -> Result<CompactionReport, StoreError> {
        let mut arena = self.arena.write().map_err(|_| StoreError::Poisoned)?;
        let mut report = CompactionReport::default();

        for days in arena
            .iter_mut()
            .filter(|((_, m), _)| *m == month_year)
            .map(|(_, days)| days)
        {
            report.loaded += days.len();
            while days.len() > 1 {
                days.pop_first();
                report.deleted += 1;
            }
            report.remaining += days.len();
        }

        Ok(report)
    }
}
