//! Timetable harvesting.
//!
//! A harvest run walks the published schedule of every facility, downloads
//! each month's spreadsheet (falling back to the PDF), and stores the
//! parsed records under a save date derived from the schedule month.

mod job;
mod report;
mod schedule;

pub use job::{Harvester, save_date};
pub use report::{HarvestFailure, HarvestReport, SourceKind};
pub use schedule::{FacilitySchedule, HarvestRequest, ScheduleEntry};
