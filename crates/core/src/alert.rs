//! Alert types produced by threshold classification.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Which limit a reading breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PressureLow,
    PressureHigh,
    SpeedExceeded,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PressureLow => "pressure_low",
            AlertType::PressureHigh => "pressure_high",
            AlertType::SpeedExceeded => "speed_exceeded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pressure_low" => Some(AlertType::PressureLow),
            "pressure_high" => Some(AlertType::PressureHigh),
            "speed_exceeded" => Some(AlertType::SpeedExceeded),
            _ => None,
        }
    }

    /// Display label used as the timeline title for this alert type.
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::PressureLow => "Pressão baixa",
            AlertType::PressureHigh => "Pressão alta",
            AlertType::SpeedExceeded => "Velocidade excedida",
        }
    }
}

/// Ordinal severity, `Critical` being the most severe.
///
/// Alerts only ever carry `Critical`, `High` or `Medium`; `Low` exists for
/// timeline events derived from telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// Alert lifecycle. Ingestion only creates `Open` alerts; transitions happen
/// elsewhere (operator action, occurrence closure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    InProgress,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::InProgress => "in_progress",
            AlertStatus::Resolved => "resolved",
        }
    }
}

/// An alert generated from one reading, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDraft {
    pub machine_id: DbId,
    pub tire_id: Option<DbId>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: String,
    pub reason: String,
    pub probable_cause: String,
    pub recommended_action: String,
    pub opened_at: Timestamp,
}
