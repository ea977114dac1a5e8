//! Handler for telemetry ingestion.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use fleetwatch_core::types::Timestamp;
use serde::Serialize;

use crate::engine::ingest::ingest_batch;
use crate::error::AppResult;
use crate::middleware::auth::IngestCredential;
use crate::state::AppState;

/// Success body. Field names are part of the device contract.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub processed: usize,
    pub alerts_generated: usize,
    /// When the batch was received.
    pub timestamp: Timestamp,
}

/// POST /telemetry/ingest
///
/// Accepts a single reading or `{ "readings": [...] }`. The body is taken
/// as raw bytes so malformed JSON surfaces as a field error at `body`
/// instead of an extractor rejection.
pub async fn ingest_telemetry(
    State(state): State<AppState>,
    IngestCredential(credential): IngestCredential,
    body: Bytes,
) -> AppResult<Json<IngestResponse>> {
    let received_at = Utc::now();

    let outcome = ingest_batch(
        state.store.as_ref(),
        &credential,
        &body,
        received_at,
        state.config.store_timeout(),
    )
    .await?;

    Ok(Json(IngestResponse {
        success: true,
        processed: outcome.processed,
        alerts_generated: outcome.alerts_generated,
        timestamp: received_at,
    }))
}
