//! Telemetry ingestion pipeline.
//!
//! Steps run in a fixed order: parse, referential check, telemetry insert,
//! machine state updates, alert insert, audit append. Only the first three
//! can fail the request. The later writes are best effort: their failures
//! are collected as [`DegradedStep`]s and logged, and the caller still gets
//! a success response because the telemetry itself was stored.

use std::collections::HashSet;
use std::time::Duration;

use fleetwatch_core::alert::AlertDraft;
use fleetwatch_core::error::CoreError;
use fleetwatch_core::telemetry::{classify, parse_readings, reduce_machine_states, Reading};
use fleetwatch_core::types::{DbId, Timestamp};
use fleetwatch_db::models::audit::NewAuditEvent;
use fleetwatch_db::models::telemetry::NewTelemetry;
use fleetwatch_db::{with_timeout, IngestStore, StoreError};
use futures::future::join_all;
use indexmap::IndexSet;

use crate::auth::Credential;
use crate::error::AppError;

/// Audit action recorded for every accepted batch.
pub const INGEST_AUDIT_ACTION: &str = "telemetry.ingest";

/// A best-effort write that failed without failing the request.
#[derive(Debug)]
pub enum DegradedStep {
    MachineState { machine_id: DbId, error: StoreError },
    Alerts { attempted: usize, error: StoreError },
    Audit { error: StoreError },
}

impl DegradedStep {
    fn log(&self) {
        match self {
            DegradedStep::MachineState { machine_id, error } => {
                tracing::warn!(%machine_id, error = %error, "Machine state update failed");
            }
            DegradedStep::Alerts { attempted, error } => {
                tracing::warn!(attempted, error = %error, "Alert insert failed");
            }
            DegradedStep::Audit { error } => {
                tracing::warn!(error = %error, "Audit append failed");
            }
        }
    }
}

/// Result of an accepted batch.
#[derive(Debug)]
pub struct IngestOutcome {
    pub processed: usize,
    /// Alerts classified from the batch, whether or not their insert
    /// succeeded.
    pub alerts_generated: usize,
    pub machines_updated: usize,
    pub degraded: Vec<DegradedStep>,
}

/// Run one ingestion request against `store`.
///
/// `received_at` fills missing reading timestamps and sequence numbers.
/// Every store call is bounded by `store_timeout`.
pub async fn ingest_batch<S>(
    store: &S,
    credential: &Credential,
    body: &[u8],
    received_at: Timestamp,
    store_timeout: Duration,
) -> Result<IngestOutcome, AppError>
where
    S: IngestStore + ?Sized,
{
    let readings = parse_readings(body, received_at)?;

    ensure_machines_exist(store, &readings, store_timeout).await?;

    let rows: Vec<NewTelemetry> = readings.iter().map(NewTelemetry::from).collect();
    let alerts: Vec<AlertDraft> = readings
        .iter()
        .flat_map(|r| classify(r, r.timestamp))
        .collect();
    let updates = reduce_machine_states(&readings);

    with_timeout(store_timeout, store.insert_telemetry(&rows)).await?;

    let mut degraded = Vec::new();

    let results = join_all(
        updates
            .iter()
            .map(|update| with_timeout(store_timeout, store.update_machine_state(update))),
    )
    .await;
    for (update, result) in updates.iter().zip(results) {
        if let Err(error) = result {
            degraded.push(DegradedStep::MachineState {
                machine_id: update.machine_id,
                error,
            });
        }
    }

    if !alerts.is_empty() {
        if let Err(error) = with_timeout(store_timeout, store.insert_alerts(&alerts)).await {
            degraded.push(DegradedStep::Alerts {
                attempted: alerts.len(),
                error,
            });
        }
    }

    let audit = NewAuditEvent {
        action: INGEST_AUDIT_ACTION.to_string(),
        source_kind: credential.kind().to_string(),
        source_id: credential.source_id().to_string(),
        details: serde_json::json!({
            "processed": readings.len(),
            "alertsGenerated": alerts.len(),
            "machines": updates.len(),
        }),
    };
    if let Err(error) = with_timeout(store_timeout, store.append_audit_event(&audit)).await {
        degraded.push(DegradedStep::Audit { error });
    }

    for step in &degraded {
        step.log();
    }

    let outcome = IngestOutcome {
        processed: readings.len(),
        alerts_generated: alerts.len(),
        machines_updated: updates.len(),
        degraded,
    };

    tracing::info!(
        processed = outcome.processed,
        alerts = outcome.alerts_generated,
        machines = outcome.machines_updated,
        degraded = outcome.degraded.len(),
        source = credential.kind(),
        "Telemetry batch ingested"
    );

    Ok(outcome)
}

/// Fail with the unknown ids, in first-seen order, if any machine of the
/// batch does not exist. Runs before anything is written.
async fn ensure_machines_exist<S>(
    store: &S,
    readings: &[Reading],
    store_timeout: Duration,
) -> Result<(), AppError>
where
    S: IngestStore + ?Sized,
{
    let requested: IndexSet<DbId> = readings.iter().map(|r| r.machine_id).collect();
    let ids: Vec<DbId> = requested.iter().copied().collect();

    let existing: HashSet<DbId> = with_timeout(store_timeout, store.existing_machine_ids(&ids))
        .await?
        .into_iter()
        .collect();

    let unknown: Vec<DbId> = ids.into_iter().filter(|id| !existing.contains(id)).collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(CoreError::UnknownMachines(unknown).into())
    }
}
