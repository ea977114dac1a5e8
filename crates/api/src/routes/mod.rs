pub mod health;
pub mod telemetry;
pub mod timeline;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /telemetry/ingest                     POST ingest (device key or bearer)
/// /machines/{machine_id}/timeline       GET timeline (bearer)
/// /timeline?machineId=...               GET timeline (bearer)
/// ```
///
/// Every route answers a bare `OPTIONS` with an empty 200 and any other
/// unregistered method with a 405 JSON error.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(telemetry::router())
        .merge(timeline::router())
}
