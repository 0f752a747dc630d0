//! The harvest job: download, extract, persist.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::{FacilityId, FacilityInfo, FacilityTimetableDocument, MonthYear, TimetableRecord};
use crate::download::{DocumentSource, DownloadError};
use crate::store::{DocumentKey, TimetableStore};
use crate::timetable::{ExtractOptions, ExtractionError, extract_from_pdf, extract_from_spreadsheet};

use super::report::{HarvestReport, SourceKind};
use super::schedule::{FacilitySchedule, ScheduleEntry};

/// Default number of schedule entries fetched concurrently.
const DEFAULT_CONCURRENCY: usize = 4;

/// Why one source document produced no records.
#[derive(Debug, thiserror::Error)]
enum SourceError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("extraction task failed: {0}")]
    Worker(String),
}

/// One schedule entry ready to harvest.
struct Job {
    info: FacilityInfo,
    entry: ScheduleEntry,
    month_year: MonthYear,
    save_date: NaiveDate,
    current_month: bool,
}

/// What harvesting one entry produced.
#[derive(Default)]
struct Outcome {
    records: Vec<TimetableRecord>,
    kind: Option<SourceKind>,
    failures: Vec<(SourceKind, String, SourceError)>,
}

/// Where and under which flag the records of a month are saved.
///
/// The current month is saved under today's date so that repeated runs
/// supersede each other; other months are saved under their first day.
pub fn save_date(month_year: MonthYear, today: NaiveDate) -> Option<(NaiveDate, bool)> {
    if month_year.contains(today) {
        Some((today, true))
    } else {
        month_year.day(1).map(|d| (d, false))
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Harvests published timetables into a store.
pub struct Harvester<D, S> {
    source: D,
    store: S,
    options: ExtractOptions,
    concurrency: usize,
}

impl<D: DocumentSource, S: TimetableStore> Harvester<D, S> {
    pub fn new(source: D, store: S) -> Self {
        Self {
            source,
            store,
            options: ExtractOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how many schedule entries are fetched at once.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Harvest every schedule entry of every facility.
    ///
    /// Failures are collected in the report; the run itself never fails.
    /// Records are persisted in schedule order, so when several records
    /// share a save key the last one wins.
    pub async fn run(&self, facilities: &[FacilitySchedule], now: DateTime<FixedOffset>) -> HarvestReport {
        let today = now.date_naive();
        let mut report = HarvestReport {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, false),
            ..HarvestReport::default()
        };

        let jobs = plan(facilities, today);
        info!(facilities = facilities.len(), entries = jobs.len(), "starting harvest");

        let outcomes: Vec<(Job, Outcome)> = stream::iter(jobs)
            .map(|job| async move {
                let outcome = self.harvest_entry(&job.entry, job.month_year).await;
                (job, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (job, outcome) in outcomes {
            self.persist(&job, outcome, &mut report);
        }

        info!(
            saved = report.saved(),
            failed = report.errors.len(),
            "harvest finished"
        );
        report
    }

    /// Spreadsheet first; the PDF when the spreadsheet gave no timetable.
    async fn harvest_entry(&self, entry: &ScheduleEntry, month_year: MonthYear) -> Outcome {
        let mut outcome = Outcome::default();

        if let Some(url) = present(&entry.excel_url) {
            match self.spreadsheet(url, month_year).await {
                Ok(records) => {
                    outcome.records = records;
                    outcome.kind = Some(SourceKind::Excel);
                }
                Err(e) => {
                    warn!(url, %month_year, error = %e, "spreadsheet harvest failed");
                    outcome.failures.push((SourceKind::Excel, url.to_string(), e));
                }
            }
        }

        let has_timetable = outcome.records.iter().any(TimetableRecord::has_timetable);
        if !has_timetable && let Some(url) = present(&entry.pdf_url) {
            match self.pdf(url, month_year).await {
                Ok(records) => {
                    outcome.records = records;
                    outcome.kind = Some(SourceKind::Pdf);
                }
                Err(e) => {
                    warn!(url, %month_year, error = %e, "PDF harvest failed");
                    outcome.failures.push((SourceKind::Pdf, url.to_string(), e));
                }
            }
        }

        outcome
    }

    async fn spreadsheet(&self, url: &str, month_year: MonthYear) -> Result<Vec<TimetableRecord>, SourceError> {
        let document = self.source.fetch(url).await?;
        let options = self.options.clone();
        extract_off_executor(move || extract_from_spreadsheet(&document, month_year, &options)).await
    }

    async fn pdf(&self, url: &str, month_year: MonthYear) -> Result<Vec<TimetableRecord>, SourceError> {
        let document = self.source.fetch(url).await?;
        extract_off_executor(move || extract_from_pdf(&document, month_year)).await
    }

    fn persist(&self, job: &Job, outcome: Outcome, report: &mut HarvestReport) {
        for (kind, url, error) in &outcome.failures {
            report.record_failure(*kind, url, error);
        }

        let Some(kind) = outcome.kind else {
            return;
        };

        let key = DocumentKey::new(job.info.facility_id.clone(), job.save_date);
        let mut saved = 0;
        for record in outcome.records {
            let url = record.source.url().to_string();
            let document = FacilityTimetableDocument {
                facility: job.info.clone(),
                record,
            };
            match self.store.upsert(&key, document) {
                Ok(stored) => {
                    debug!(id = %stored.id, "saved timetable record");
                    saved += 1;
                }
                Err(e) => {
                    warn!(%url, error = %e, "failed to save timetable record");
                    report.record_failure(SourceKind::Store, &url, e);
                }
            }
        }
        report.count_saved(kind, job.current_month, saved);
    }
}

/// Parse a downloaded document on the blocking pool.
async fn extract_off_executor<F>(extract: F) -> Result<Vec<TimetableRecord>, SourceError>
where
    F: FnOnce() -> Result<Vec<TimetableRecord>, ExtractionError> + Send + 'static,
{
    tokio::task::spawn_blocking(extract)
        .await
        .map_err(|e| SourceError::Worker(e.to_string()))?
        .map_err(SourceError::from)
}

/// Resolve facilities and months; skip entries that cannot be harvested.
fn plan(facilities: &[FacilitySchedule], today: NaiveDate) -> Vec<Job> {
    let mut jobs = Vec::new();

    for facility in facilities {
        let facility_id = match FacilityId::parse(&facility.lcsd_number) {
            Ok(id) => id,
            Err(e) => {
                warn!(lcsd_number = %facility.lcsd_number, error = %e, "skipping facility");
                continue;
            }
        };
        let info = FacilityInfo {
            did_number: facility.did_number.clone(),
            facility_id,
            name: facility.name.clone(),
        };

        for entry in &facility.jogging_schedule {
            let Some(raw) = present(&entry.month_year) else {
                continue;
            };
            let Ok(month_year) = MonthYear::parse(raw) else {
                debug!(month_year = raw, "skipping malformed month_year");
                continue;
            };
            let Some((save_date, current_month)) = save_date(month_year, today) else {
                continue;
            };

            jobs.push(Job {
                info: info.clone(),
                entry: entry.clone(),
                month_year,
                save_date,
                current_month,
            });
        }
    }

    jobs
}
