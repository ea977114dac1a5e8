//! Occurrence entity models (read only; occurrences are reported by
//! operators through another service).

use fleetwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct OccurrenceRecord {
    pub id: DbId,
    pub machine_id: DbId,
    pub alert_id: Option<DbId>,
    pub tire_id: Option<DbId>,
    pub description: String,
    pub status: String,
    pub created_at: Timestamp,
}
