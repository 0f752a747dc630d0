//! JSON-file store: one pretty-printed envelope per key.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{FacilityId, FacilityTimetableDocument, MonthYear};

use super::error::StoreError;
use super::{CompactionReport, DEFAULT_TAG, DocumentKey, StoredDocument, TimetableStore};

/// Stores envelopes as `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FileTimetableStore {
    dir: PathBuf,
    tag: String,
}

/// Key parts parsed back from a file name.
struct FileEntry {
    path: PathBuf,
    facility: String,
    year: i32,
    month: u32,
    day: u32,
}

impl FileTimetableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tag: DEFAULT_TAG.to_string(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Parse `{tag}_{facility}_{year}_{month}_{day}.json`.
    fn parse_entry(&self, path: PathBuf) -> Option<FileEntry> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".json")?;
        let rest = stem.strip_prefix(&self.tag)?.strip_prefix('_')?;

        let mut parts = rest.rsplitn(4, '_');
        let day = parts.next()?.parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let year = parts.next()?.parse().ok()?;
        let facility = parts.next()?.to_string();

        Some(FileEntry {
            path,
            facility,
            year,
            month,
            day,
        })
    }

    /// Stored envelopes of one month, optionally for one facility.
    fn entries(
        &self,
        month_year: MonthYear,
        facility: Option<&FacilityId>,
    ) -> Result<Vec<FileEntry>, StoreError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(&self.dir, source)),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| self.io_error(&self.dir, e))?;
            let Some(entry) = self.parse_entry(dir_entry.path()) else {
                continue;
            };
            if entry.year == month_year.year()
                && entry.month == month_year.month()
                && facility.is_none_or(|f| f.as_str() == entry.facility)
            {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn load(&self, path: &Path) -> Result<StoredDocument, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| self.io_error(path, e))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl TimetableStore for FileTimetableStore {
    fn upsert(
        &self,
        key: &DocumentKey,
        document: FacilityTimetableDocument,
    ) -> Result<StoredDocument, StoreError> {
        let stored = StoredDocument::new(&self.tag, key, document);
        let path = self.path_for(&stored.id);

        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| self.io_error(&self.dir, e))?;
        }

        let json = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|e| self.io_error(&path, e))?;

        debug!(id = %stored.id, "stored timetable document");
        Ok(stored)
    }

    fn query_latest(
        &self,
        facility: &FacilityId,
        month_year: MonthYear,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let latest = self
            .entries(month_year, Some(facility))?
            .into_iter()
            .max_by_key(|e| e.day);

        latest.map(|e| self.load(&e.path)).transpose()
    }

    fn compact(&self, month_year: MonthYear) -> Result<CompactionReport, StoreError> {
        let mut entries = self.entries(month_year, None)?;
        // latest day first within each facility
        entries.sort_by(|a, b| a.facility.cmp(&b.facility).then(b.day.cmp(&a.day)));

        let mut report = CompactionReport {
            loaded: entries.len(),
            ..CompactionReport::default()
        };

        let mut previous: Option<&str> = None;
        for entry in &entries {
            if previous == Some(entry.facility.as_str()) {
                match std::fs::remove_file(&entry.path) {
                    Ok(()) => report.deleted += 1,
                    Err(e) => {
                        warn!(path = %entry.path.display(), error = %e, "failed to delete superseded document");
                        report.remaining += 1;
                    }
                }
            } else {
                report.remaining += 1;
                previous = Some(entry.facility.as_str());
            }
        }

        Ok(report)
    }
}
