use std::sync::Arc;

use fleetwatch_db::FleetStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: both fields are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend. `PgStore` in production, in-memory in tests.
    pub store: Arc<dyn FleetStore>,
    pub config: Arc<ServerConfig>,
}
