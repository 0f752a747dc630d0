//! Facility availability server.
//!
//! Harvests published facility timetables (spreadsheets and PDFs),
//! normalizes each day into status intervals, and answers: "is this
//! facility open to the public at this time?"

pub mod cache;
pub mod config;
pub mod domain;
pub mod download;
pub mod harvest;
pub mod query;
pub mod store;
pub mod timetable;
pub mod web;
