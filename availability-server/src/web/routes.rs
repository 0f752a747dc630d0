//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::domain::{FacilityId, MonthYear};
use crate::harvest::{HarvestReport, HarvestRequest};
use crate::query::{AvailabilityRequest, AvailabilityResponse, QueryError};
use crate::store::{CompactionReport, StoreError, StoredDocument, TimetableStore};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/availability",
            get(availability_query).post(availability_json),
        )
        .route("/api/timetable/:facility/:year/:month", get(latest_timetable))
        .route("/api/timetable/harvest", post(harvest))
        .route("/api/timetable/compact", post(compact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Availability from query-string parameters.
async fn availability_query(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityRequest>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let Query(req) = query.map_err(|e| AppError::BadRequest {
        message: e.body_text(),
    })?;
    answer(state, req).await
}

/// Availability from a JSON body.
async fn availability_json(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let req: AvailabilityRequest = parse_json(&body)?;
    answer(state, req).await
}

async fn answer(
    state: AppState,
    req: AvailabilityRequest,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let response = blocking(move || Ok(state.engine.handle(&req)?)).await?;
    Ok(Json(response))
}

/// The latest stored document for a facility and month.
async fn latest_timetable(
    State(state): State<AppState>,
    path: Result<Path<(String, i32, u32)>, PathRejection>,
) -> Result<Json<StoredDocument>, AppError> {
    let Path((facility, year, month)) = path.map_err(|e| AppError::BadRequest {
        message: e.body_text(),
    })?;
    let facility = FacilityId::parse(&facility).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;
    let month_year = month_year(year, month)?;

    let document = blocking(move || {
        state
            .store()
            .query_latest(&facility, month_year)?
            .ok_or_else(|| QueryError::NotFound {
                facility,
                month_year,
            }
            .into())
    })
    .await?;

    Ok(Json(document))
}

/// Harvest the posted schedules into the store.
async fn harvest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HarvestReport>, AppError> {
    let req: HarvestRequest = parse_json(&body)?;
    info!(facilities = req.facilities.len(), "harvest requested");

    let now = state.engine.now();
    let report = state.harvester.run(&req.facilities, now).await;
    Ok(Json(report))
}

/// Drop superseded documents for one month.
async fn compact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompactionReport>, AppError> {
    let req: CompactRequest = parse_json(&body)?;
    let month_year = month_year(req.year, req.month)?;

    let report = blocking(move || Ok(state.store().compact(month_year)?)).await?;
    info!(
        %month_year,
        loaded = report.loaded,
        deleted = report.deleted,
        "compacted stored timetables"
    );
    Ok(Json(report))
}

fn month_year(year: i32, month: u32) -> Result<MonthYear, AppError> {
    MonthYear::new(month, year).ok_or_else(|| AppError::BadRequest {
        message: format!("Invalid month: {month}/{year}"),
    })
}

/// Parse a JSON body, logging it on failure.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "invalid JSON body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Run store work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("worker task failed: {e}"),
        })?
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        match e {
            QueryError::Validation(_) => AppError::BadRequest { message },
            QueryError::NotFound { .. } => AppError::NotFound { message },
            QueryError::Backend { .. } => AppError::Internal { message },
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
