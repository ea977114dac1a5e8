//! Storage traits the request engines are written against.
//!
//! Ingestion writes run in the privileged mode of the store. Timeline reads
//! always carry an [`AccessScope`] so the backend can restrict rows to what
//! the caller's identity may see.
//!
//! Implementations must be `Send + Sync + 'static` so they can sit behind an
//! `Arc<dyn FleetStore>` in the axum application state.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use fleetwatch_core::alert::AlertDraft;
use fleetwatch_core::telemetry::MachineStateUpdate;
use fleetwatch_core::types::{DbId, Timestamp};

use crate::models::alert::AlertRecord;
use crate::models::audit::NewAuditEvent;
use crate::models::machine::MachineSummary;
use crate::models::occurrence::OccurrenceRecord;
use crate::models::telemetry::{NewTelemetry, TelemetryRecord};

/// All errors a store implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The call did not finish within the caller's deadline.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// A database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A backend-specific failure that is not a sqlx error.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Identity under which timeline reads run.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessScope {
    /// Token subject (user id).
    pub subject: String,
    /// The verified token claims, forwarded to row-level security policies.
    pub claims: serde_json::Value,
}

/// Bounds shared by the three timeline source queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineWindow {
    pub machine_id: DbId,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    /// Maximum rows to return, newest first.
    pub limit: i64,
}

impl TimelineWindow {
    /// The same window with a smaller row cap.
    pub fn capped(&self, limit: i64) -> Self {
        Self {
            limit: self.limit.min(limit),
            ..self.clone()
        }
    }
}

/// Writes performed by telemetry ingestion.
#[async_trait]
pub trait IngestStore: Send + Sync + 'static {
    /// Return the subset of `ids` that exist as machines.
    async fn existing_machine_ids(&self, ids: &[DbId]) -> Result<Vec<DbId>, StoreError>;

    /// Bulk-insert telemetry rows. All rows are written or none are.
    async fn insert_telemetry(&self, rows: &[NewTelemetry]) -> Result<u64, StoreError>;

    /// Overwrite a machine's status and `last_telemetry_at`.
    async fn update_machine_state(&self, update: &MachineStateUpdate) -> Result<(), StoreError>;

    /// Bulk-insert alerts in `open` status.
    async fn insert_alerts(&self, alerts: &[AlertDraft]) -> Result<u64, StoreError>;

    /// Append one audit event.
    async fn append_audit_event(&self, event: &NewAuditEvent) -> Result<(), StoreError>;
}

/// Reads performed by the timeline aggregator.
#[async_trait]
pub trait TimelineStore: Send + Sync + 'static {
    async fn find_machine(
        &self,
        scope: &AccessScope,
        machine_id: DbId,
    ) -> Result<Option<MachineSummary>, StoreError>;

    /// Alerts in the window, newest `opened_at` first.
    async fn recent_alerts(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<AlertRecord>, StoreError>;

    /// Occurrences in the window, newest `created_at` first.
    async fn recent_occurrences(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<OccurrenceRecord>, StoreError>;

    /// Telemetry in the window that breaches a warning limit
    /// (`pressure < 2.5 OR pressure > 4.5 OR speed > 60`), newest first.
    async fn recent_flagged_telemetry(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<TelemetryRecord>, StoreError>;
}

/// Everything the API needs from a store.
#[async_trait]
pub trait FleetStore: IngestStore + TimelineStore {
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Bound a store call by `limit`, mapping expiry to [`StoreError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
