//! Web layer for the availability server.
//!
//! Provides HTTP endpoints for availability queries, stored timetables,
//! harvesting and compaction.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, SharedStore};
