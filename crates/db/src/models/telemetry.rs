//! Telemetry entity models and DTOs (append-only).

use fleetwatch_core::telemetry::Reading;
use fleetwatch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A stored telemetry sample.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TelemetryRecord {
    pub id: DbId,
    pub machine_id: DbId,
    pub tire_id: Option<DbId>,
    pub pressure: f64,
    pub speed: f64,
    pub seq: i64,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for inserting a telemetry row. Identity is assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTelemetry {
    pub machine_id: DbId,
    pub tire_id: Option<DbId>,
    pub pressure: f64,
    pub speed: f64,
    pub seq: i64,
    pub recorded_at: Timestamp,
}

impl From<&Reading> for NewTelemetry {
    fn from(reading: &Reading) -> Self {
        Self {
            machine_id: reading.machine_id,
            tire_id: reading.tire_id,
            pressure: reading.pressure,
            speed: reading.speed,
            seq: reading.seq,
            recorded_at: reading.timestamp,
        }
    }
}
