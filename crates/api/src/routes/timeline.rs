//! Route definitions for machine timelines.

use axum::routing::get;
use axum::Router;

use crate::handlers::method::method_not_allowed;
use crate::handlers::timeline;
use crate::state::AppState;

/// ```text
/// GET /machines/{machine_id}/timeline   -> get_machine_timeline
/// GET /timeline                         -> get_timeline (machineId query param)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/machines/{machine_id}/timeline",
            get(timeline::get_machine_timeline).fallback(method_not_allowed),
        )
        .route(
            "/timeline",
            get(timeline::get_timeline).fallback(method_not_allowed),
        )
}
