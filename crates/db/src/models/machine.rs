//! Machine entity models.

use fleetwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// The machine fields exposed alongside a timeline.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSummary {
    pub id: DbId,
    pub name: String,
    pub model: Option<String>,
    pub status: String,
    pub last_telemetry_at: Option<Timestamp>,
}
