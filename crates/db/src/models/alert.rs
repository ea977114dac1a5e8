//! Alert entity models.
//!
//! Alerts are inserted from [`fleetwatch_core::alert::AlertDraft`] values;
//! status transitions after insertion are owned by other services.

use fleetwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A stored alert.
///
/// `alert_type`, `severity` and `status` are kept as the stored strings so
/// rows written by other services with values this crate does not know
/// still load.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AlertRecord {
    pub id: DbId,
    pub machine_id: DbId,
    pub tire_id: Option<DbId>,
    #[sqlx(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub status: String,
    pub message: String,
    pub reason: Option<String>,
    pub probable_cause: Option<String>,
    pub recommended_action: Option<String>,
    pub opened_at: Timestamp,
}
