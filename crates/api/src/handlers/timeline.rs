//! Handlers for the machine timeline (path and query string variants).

use axum::extract::{Path, Query, State};
use axum::Json;
use fleetwatch_core::error::CoreError;
use fleetwatch_core::timeline::{clamp_limit, parse_date_param, EventFilter};
use fleetwatch_core::types::{parse_id, Timestamp};
use serde::Deserialize;

use crate::engine::timeline::{load_timeline, TimelineQuery, TimelineView};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query string of both timeline endpoints.
///
/// Every field is kept as a raw string: bad values are resolved by the
/// documented fallbacks rather than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
    /// Only read by `GET /timeline`.
    pub machine_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_types: Option<String>,
    pub limit: Option<String>,
}

impl TimelineParams {
    /// Resolve the parameters for `machine_id`.
    ///
    /// A machine id that is not a hyphenated UUID cannot exist, so it is a
    /// 404 rather than a validation error.
    pub fn resolve(&self, machine_id: &str) -> AppResult<TimelineQuery> {
        let machine_id = parse_id(machine_id.trim()).ok_or_else(|| CoreError::NotFound {
            entity: "Machine",
            id: machine_id.to_string(),
        })?;

        let start = parse_date("startDate", self.start_date.as_deref())?;
        let end = parse_date("endDate", self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::BadRequest(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }

        Ok(TimelineQuery {
            machine_id,
            start,
            end,
            filter: EventFilter::parse(self.event_types.as_deref()),
            limit: clamp_limit(self.limit.as_deref()),
        })
    }
}

fn parse_date(name: &str, raw: Option<&str>) -> AppResult<Option<Timestamp>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => parse_date_param(value).map(Some).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "{name} must be an ISO 8601 date or date-time"
            )))
        }),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /machines/{machine_id}/timeline
pub async fn get_machine_timeline(
    State(state): State<AppState>,
    user: AuthUser,
    Path(machine_id): Path<String>,
    Query(params): Query<TimelineParams>,
) -> AppResult<Json<TimelineView>> {
    let query = params.resolve(&machine_id)?;
    respond(&state, &user, &query).await
}

/// GET /timeline?machineId=...
pub async fn get_timeline(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<TimelineParams>,
) -> AppResult<Json<TimelineView>> {
    let machine_id = params
        .machine_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("machineId is required".to_string()))?;
    let query = params.resolve(machine_id)?;
    respond(&state, &user, &query).await
}

async fn respond(
    state: &AppState,
    user: &AuthUser,
    query: &TimelineQuery,
) -> AppResult<Json<TimelineView>> {
    tracing::info!(
        subject = %user.subject,
        machine_id = %query.machine_id,
        limit = query.limit,
        "Timeline requested"
    );

    let view = load_timeline(
        state.store.as_ref(),
        &user.scope(),
        query,
        state.config.store_timeout(),
    )
    .await?;
    Ok(Json(view))
}
