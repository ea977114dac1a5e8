//! Route definitions for telemetry ingestion.

use axum::routing::post;
use axum::Router;

use crate::handlers::ingest;
use crate::handlers::method::method_not_allowed;
use crate::state::AppState;

/// ```text
/// POST    /telemetry/ingest   -> ingest_telemetry
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/telemetry/ingest",
        post(ingest::ingest_telemetry).fallback(method_not_allowed),
    )
}
