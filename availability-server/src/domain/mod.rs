//! Domain types for facility availability timetables.
//!
//! All types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod facility;
mod interval;
mod month;
mod record;
mod time;

pub use facility::{FacilityId, InvalidFacilityId};
pub use interval::{CanonicalInterval, DEFAULT_STATUS, RawInterval};
pub use month::{InvalidMonthYear, MonthYear};
pub use record::{
    FacilityInfo, FacilityTimetableDocument, LegendMap, PdfSourceTag, RecordSource, Timetable,
    TimetableRecord,
};
pub use time::{SECONDS_PER_DAY, TimeError, TimeLabel};
