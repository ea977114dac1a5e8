//! Audit event DTOs. Audit events are append-only and never read back by
//! this service.

use serde::Serialize;

/// DTO for appending an audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEvent {
    /// Dotted action name, e.g. `telemetry.ingest`.
    pub action: String,
    /// `device` or `user`.
    pub source_kind: String,
    /// Device key fingerprint or user subject.
    pub source_id: String,
    pub details: serde_json::Value,
}
