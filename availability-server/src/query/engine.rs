//! Availability query engine.
//!
//! Reads the latest stored timetable for a facility and month and answers
//! point and period questions against one date's canonical intervals.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use tracing::debug;

use crate::domain::{FacilityId, MonthYear, TimeLabel, TimetableRecord};
use crate::store::{StoredDocument, TimetableStore};

use super::clock::{Clock, SystemClock};
use super::config::{CLOSED_STATUS, QueryConfig};
use super::error::QueryError;
use super::request::{AvailabilityRequest, ParsedQuery, Period};
use super::response::{
    Availability, AvailabilityResponse, AvailabilitySegment, PeriodRequested, PeriodResponse,
    PointRequested, PointResponse,
};
use super::slice::{SliceStatus, closed_ranges, range_label, slice_period, status_at};

/// The stored document a query resolved to, plus when the query ran.
struct Resolved {
    now: DateTime<FixedOffset>,
    date: NaiveDate,
    document: StoredDocument,
}

impl Resolved {
    fn record(&self) -> &TimetableRecord {
        &self.document.data.record
    }

    fn facility_name(&self) -> String {
        self.document.data.facility.name.clone()
    }

    fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

/// Answers availability queries from stored timetables.
pub struct AvailabilityQueryEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: QueryConfig,
}

impl<S: TimetableStore> AvailabilityQueryEngine<S> {
    /// Create an engine reading the system clock at the configured offset.
    pub fn new(store: S, config: QueryConfig) -> Self {
        let clock = SystemClock::with_offset_secs(config.utc_offset_secs).unwrap_or_default();
        Self {
            store,
            clock: Arc::new(clock),
            config,
        }
    }

    /// Replace the clock (for testing).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current instant in the authority timezone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    /// Validate a raw request and answer it.
    pub fn handle(&self, request: &AvailabilityRequest) -> Result<AvailabilityResponse, QueryError> {
        match request.parse()? {
            ParsedQuery::Point {
                facility,
                date,
                time,
            } => self
                .query_point(&facility, date, time)
                .map(AvailabilityResponse::Point),
            ParsedQuery::Period {
                facility,
                date,
                period,
            } => self
                .query_period(&facility, date, &period)
                .map(AvailabilityResponse::Period),
        }
    }

    /// Status at one instant. Date and time default to now.
    pub fn query_point(
        &self,
        facility: &FacilityId,
        date: Option<NaiveDate>,
        time: Option<TimeLabel>,
    ) -> Result<PointResponse, QueryError> {
        let resolved = self.resolve(facility, date)?;
        let time = time.unwrap_or_else(|| TimeLabel::from(resolved.now.time()));

        let record = resolved.record();
        let ranges = closed_ranges(record.intervals_for(resolved.date));

        let (status_letter, availability, legend) = match status_at(&ranges, time.seconds()) {
            Some(status) => (
                status.to_string(),
                Availability::from(self.config.is_available(status)),
                record.legend_map.describe(status).map(str::to_string),
            ),
            None => (
                CLOSED_STATUS.to_string(),
                Availability::False,
                Some(self.config.closed_legend.clone()),
            ),
        };

        debug!(%facility, date = %resolved.date, %time, status = %status_letter, "point query");

        Ok(PointResponse {
            timestamp_queried: resolved.timestamp(),
            facility_name: resolved.facility_name(),
            requested: PointRequested {
                lcsdid: facility.to_string(),
                datetime_iso: format!("{}T{}", resolved.date, time.to_hhmmss()),
            },
            status_letter,
            availability,
            legend,
        })
    }

    /// Segments covering a same-day period. Date defaults to today.
    pub fn query_period(
        &self,
        facility: &FacilityId,
        date: Option<NaiveDate>,
        period: &Period,
    ) -> Result<PeriodResponse, QueryError> {
        let resolved = self.resolve(facility, date)?;

        let record = resolved.record();
        let ranges = closed_ranges(record.intervals_for(resolved.date));
        let q_start = period.start().seconds();
        let q_end = period.end().seconds() - 1;

        let segments: Vec<AvailabilitySegment> = slice_period(&ranges, q_start, q_end)
            .into_iter()
            .map(|slice| {
                let time_range = range_label(slice.start, slice.end);
                match slice.status {
                    SliceStatus::Closed => AvailabilitySegment {
                        time_range,
                        status_letter: CLOSED_STATUS.to_string(),
                        availability: Availability::False,
                        legend: Some(self.config.closed_legend.clone()),
                    },
                    SliceStatus::Status(status) => AvailabilitySegment {
                        time_range,
                        status_letter: status.to_string(),
                        availability: Availability::from(self.config.is_available(status)),
                        legend: record.legend_map.describe(status).map(str::to_string),
                    },
                }
            })
            .collect();

        debug!(%facility, date = %resolved.date, %period, segments = segments.len(), "period query");

        Ok(PeriodResponse {
            timestamp_queried: resolved.timestamp(),
            facility_name: resolved.facility_name(),
            requested: PeriodRequested {
                lcsdid: facility.to_string(),
                date: resolved.date.to_string(),
                period: period.to_string(),
            },
            segments,
        })
    }

    /// Resolve the date, check the month window and load the document.
    fn resolve(&self, facility: &FacilityId, date: Option<NaiveDate>) -> Result<Resolved, QueryError> {
        let now = self.clock.now();
        let today = now.date_naive();
        let date = date.unwrap_or(today);

        let current = MonthYear::of(today);
        let month_year = MonthYear::of(date);
        if month_year != current && month_year != current.next() {
            return Err(QueryError::validation(
                "only current or next month timetables are accepted",
            ));
        }

        let document = self
            .store
            .query_latest(facility, month_year)
            .map_err(|source| QueryError::Backend {
                facility: facility.clone(),
                month_year,
                source,
            })?
            .ok_or_else(|| QueryError::NotFound {
                facility: facility.clone(),
                month_year,
            })?;

        Ok(Resolved {
            now,
            date,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CanonicalInterval, FacilityInfo, FacilityTimetableDocument, RecordSource, Timetable,
    };
    use crate::query::FixedClock;
    use crate::store::{CompactionReport, DocumentKey, MemoryTimetableStore, StoreError};
    use chrono::TimeZone;

    fn t(s: &str) -> TimeLabel {
        TimeLabel::parse(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn facility() -> FacilityId {
        FacilityId::parse("1060a").unwrap()
    }

    /// 2025-07-10 09:00 Hong Kong time.
    fn clock() -> FixedClock {
        let hk = FixedOffset::east_opt(8 * 3600).unwrap();
        FixedClock(hk.with_ymd_and_hms(2025, 7, 10, 9, 0, 0).unwrap())
    }

    fn document() -> FacilityTimetableDocument {
        let mut timetable = Timetable::new();
        timetable.insert(
            date(2025, 7, 10),
            vec![
                CanonicalInterval::new(t("07:00"), t("08:00"), "A"),
                CanonicalInterval::new(t("08:00"), t("22:00"), "X"),
            ],
        );
        timetable.insert(
            date(2025, 7, 11),
            vec![
                CanonicalInterval::new(t("07:00"), t("12:00"), "A"),
                CanonicalInterval::new(t("12:00"), t("13:00"), "Q"),
                CanonicalInterval::new(t("13:00"), t("22:00"), "L"),
            ],
        );
        FacilityTimetableDocument {
            facility: FacilityInfo {
                did_number: Some("D-7".to_string()),
                facility_id: facility(),
                name: "Victoria Park Sports Ground".to_string(),
            },
            record: TimetableRecord {
                month_year: MonthYear::new(7, 2025).unwrap(),
                source: RecordSource::spreadsheet("https://example.org/vp.xlsx"),
                content_digest: String::new(),
                timetable,
                legend_map: [("X", "Maintenance"), ("L", "Jogging lane")].into_iter().collect(),
                section: None,
                page: None,
            },
        }
    }

    fn engine(config: QueryConfig) -> AvailabilityQueryEngine<MemoryTimetableStore> {
        let store = MemoryTimetableStore::default();
        store
            .upsert(&DocumentKey::new(facility(), date(2025, 7, 1)), document())
            .unwrap();
        AvailabilityQueryEngine::new(store, config).with_clock(clock())
    }

    #[test]
    fn point_queries_against_allow_list() {
        let engine = engine(QueryConfig::new().with_available_codes(["A"]));
        let day = Some(date(2025, 7, 10));

        let r = engine.query_point(&facility(), day, Some(t("07:30"))).unwrap();
        assert_eq!(r.status_letter, "A");
        assert_eq!(r.availability, Availability::True);

        let r = engine.query_point(&facility(), day, Some(t("09:00"))).unwrap();
        assert_eq!(r.status_letter, "X");
        assert_eq!(r.availability, Availability::False);
        assert_eq!(r.legend.as_deref(), Some("Maintenance"));

        let r = engine.query_point(&facility(), day, Some(t("05:00"))).unwrap();
        assert_eq!(r.status_letter, "closed");
        assert_eq!(r.availability, Availability::False);
        assert_eq!(r.legend.as_deref(), Some("運動場關閉時間"));
    }

    #[test]
    fn interval_end_is_exclusive() {
        let engine = engine(QueryConfig::default());
        let day = Some(date(2025, 7, 10));

        let r = engine.query_point(&facility(), day, Some(t("07:59:59"))).unwrap();
        assert_eq!(r.status_letter, "A");
        let r = engine.query_point(&facility(), day, Some(t("08:00"))).unwrap();
        assert_eq!(r.status_letter, "X");
        let r = engine.query_point(&facility(), day, Some(t("22:00"))).unwrap();
        assert_eq!(r.status_letter, "closed");
    }

    #[test]
    fn point_defaults_to_now() {
        let engine = engine(QueryConfig::default());
        let r = engine.query_point(&facility(), None, None).unwrap();

        assert_eq!(r.requested.datetime_iso, "2025-07-10T09:00:00");
        assert_eq!(r.status_letter, "X");
        assert_eq!(r.timestamp_queried, "2025-07-10T09:00:00+08:00");
        assert_eq!(r.facility_name, "Victoria Park Sports Ground");
    }

    #[test]
    fn unknown_legend_code_is_null() {
        let engine = engine(QueryConfig::default());
        let r = engine
            .query_point(&facility(), Some(date(2025, 7, 11)), Some(t("12:30")))
            .unwrap();
        assert_eq!(r.status_letter, "Q");
        assert_eq!(r.legend, None);

        let json = serde_json::to_value(&r).unwrap();
        assert!(json["legend"].is_null());
        assert_eq!(json["availability"], "false");
    }

    #[test]
    fn untabulated_date_is_closed() {
        let engine = engine(QueryConfig::default());
        let r = engine
            .query_point(&facility(), Some(date(2025, 7, 20)), Some(t("10:00")))
            .unwrap();
        assert_eq!(r.status_letter, "closed");
    }

    #[test]
    fn period_segments() {
        let engine = engine(QueryConfig::default());
        let period = Period::parse("06:00-23:00").unwrap();
        let r = engine
            .query_period(&facility(), Some(date(2025, 7, 11)), &period)
            .unwrap();

        let segs: Vec<(&str, &str, Availability)> = r
            .segments
            .iter()
            .map(|s| (s.time_range.as_str(), s.status_letter.as_str(), s.availability))
            .collect();
        assert_eq!(
            segs,
            vec![
                ("06:00:00-06:59:59", "closed", Availability::False),
                ("07:00:00-11:59:59", "A", Availability::True),
                ("12:00:00-12:59:59", "Q", Availability::False),
                ("13:00:00-21:59:59", "L", Availability::True),
                ("22:00:00-22:59:59", "closed", Availability::False),
            ]
        );
        assert_eq!(r.segments[3].legend.as_deref(), Some("Jogging lane"));
        assert_eq!(r.requested.date, "2025-07-11");
        assert_eq!(r.requested.period, "06:00-23:00");
    }

    #[test]
    fn rejects_month_outside_window() {
        let engine = engine(QueryConfig::default());

        let err = engine
            .query_point(&facility(), Some(date(2025, 9, 1)), Some(t("10:00")))
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));

        let err = engine
            .query_point(&facility(), Some(date(2025, 6, 30)), Some(t("10:00")))
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[test]
    fn next_month_without_document_is_not_found() {
        let engine = engine(QueryConfig::default());
        let err = engine
            .query_point(&facility(), Some(date(2025, 8, 1)), Some(t("10:00")))
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));

        let other = FacilityId::parse("9999").unwrap();
        let err = engine.query_point(&other, None, None).unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));
    }

    #[test]
    fn handle_raw_requests() {
        let engine = engine(QueryConfig::default());

        let req = AvailabilityRequest {
            lcsdid: Some("1060a".into()),
            date: Some("2025-07-10".into()),
            time: Some("07:30".into()),
            period: None,
        };
        let json = serde_json::to_value(engine.handle(&req).unwrap()).unwrap();
        assert_eq!(json["requested"]["lcsdid"], "1060a");
        assert_eq!(json["requested"]["datetime_iso"], "2025-07-10T07:30:00");
        assert_eq!(json["status_letter"], "A");
        assert_eq!(json["availability"], "true");

        let req = AvailabilityRequest {
            lcsdid: Some("1060a".into()),
            date: Some("2025-07-10".into()),
            time: None,
            period: Some("07:00-09:00".into()),
        };
        let json = serde_json::to_value(engine.handle(&req).unwrap()).unwrap();
        assert_eq!(json["segments"].as_array().unwrap().len(), 2);
        assert_eq!(json["segments"][1]["time_range"], "08:00:00-08:59:59");

        let req = AvailabilityRequest {
            lcsdid: Some("1060a".into()),
            time: Some("07:30".into()),
            period: Some("07:00-09:00".into()),
            ..Default::default()
        };
        assert!(matches!(engine.handle(&req), Err(QueryError::Validation(_))));
    }

    struct FailingStore;

    impl TimetableStore for FailingStore {
        fn upsert(
            &self,
            _key: &DocumentKey,
            _document: FacilityTimetableDocument,
        ) -> Result<StoredDocument, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn query_latest(
            &self,
            _facility: &FacilityId,
            _month_year: MonthYear,
        ) -> Result<Option<StoredDocument>, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn compact(&self, _month_year: MonthYear) -> Result<CompactionReport, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn store_failure_is_backend_error() {
        let engine = AvailabilityQueryEngine::new(FailingStore, QueryConfig::default()).with_clock(clock());
        let err = engine.query_point(&facility(), None, None).unwrap_err();
        assert!(matches!(err, QueryError::Backend { .. }));
    }
}
