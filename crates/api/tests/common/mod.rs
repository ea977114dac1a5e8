#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use fleetwatch_api::auth::jwt::{generate_access_token, JwtConfig};
use fleetwatch_api::config::ServerConfig;
use fleetwatch_api::router::build_app_router;
use fleetwatch_api::state::AppState;
use fleetwatch_core::alert::AlertDraft;
use fleetwatch_core::telemetry::MachineStateUpdate;
use fleetwatch_core::types::{DbId, Timestamp};
use fleetwatch_db::models::alert::AlertRecord;
use fleetwatch_db::models::audit::NewAuditEvent;
use fleetwatch_db::models::machine::MachineSummary;
use fleetwatch_db::models::occurrence::OccurrenceRecord;
use fleetwatch_db::models::telemetry::{NewTelemetry, TelemetryRecord};
use fleetwatch_db::{
    AccessScope, FleetStore, IngestStore, StoreError, TimelineStore, TimelineWindow,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const DEVICE_KEY: &str = "device-key-for-tests";
pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        store_timeout_ms: 2_000,
        db_max_connections: 1,
        rls_role: "authenticated".to_string(),
        device_api_key: Some(DEVICE_KEY.to_string()),
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            audience: None,
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router over `store`, through the same
/// builder the binary uses.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A bearer token for `subject` signed with the test secret.
pub fn user_token(subject: &str) -> String {
    generate_access_token(subject, "authenticated", &test_config().jwt)
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// POST a raw body to the ingestion endpoint with the device key.
pub async fn ingest(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::post("/api/v1/telemetry/ingest")
        .header("content-type", "application/json")
        .header("x-device-key", DEVICE_KEY)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// GET `uri` with a bearer token for `subject`.
pub async fn get_as(app: Router, uri: &str, subject: &str) -> (StatusCode, Value) {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {}", user_token(subject)))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a request and parse the body as JSON (`Null` when empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    machines: Vec<MachineSummary>,
    /// `(machine_id, subject)` pairs standing in for organization membership.
    members: Vec<(DbId, String)>,
    telemetry: Vec<TelemetryRecord>,
    alerts: Vec<AlertRecord>,
    occurrences: Vec<OccurrenceRecord>,
    audit: Vec<NewAuditEvent>,
}

/// [`FleetStore`] over plain vectors, with switches that make individual
/// writes fail.
///
/// Timeline reads only return machines the scope's subject was granted
/// with [`MemoryStore::grant`], mirroring the row-level security policies.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pub fail_telemetry: AtomicBool,
    pub fail_machine_updates: AtomicBool,
    pub fail_alerts: AtomicBool,
    pub fail_audit: AtomicBool,
    pub fail_reads: AtomicBool,
}

/// Inclusive date-range check matching the SQL `IS NULL OR` bounds.
fn in_window(window: &TimelineWindow, at: Timestamp) -> bool {
    window.start.map_or(true, |s| at >= s) && window.end.map_or(true, |e| at <= e)
}

fn injected(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
    if flag.load(Ordering::SeqCst) {
        Err(StoreError::Backend(format!("injected {what} failure")))
    } else {
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn add_machine(&self, name: &str) -> DbId {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().machines.push(MachineSummary {
            id,
            name: name.to_string(),
            model: Some("CAT 793F".to_string()),
            status: "operational".to_string(),
            last_telemetry_at: None,
        });
        id
    }

    /// Let `subject` read `machine_id` and everything attached to it.
    pub fn grant(&self, machine_id: DbId, subject: &str) {
        self.inner
            .lock()
            .unwrap()
            .members
            .push((machine_id, subject.to_string()));
    }

    pub fn add_occurrence(&self, machine_id: DbId, description: &str, created_at: Timestamp) -> DbId {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().occurrences.push(OccurrenceRecord {
            id,
            machine_id,
            alert_id: None,
            tire_id: None,
            description: description.to_string(),
            status: "open".to_string(),
            created_at,
        });
        id
    }

    pub fn add_telemetry(&self, machine_id: DbId, pressure: f64, speed: f64, recorded_at: Timestamp) {
        let mut inner = self.inner.lock().unwrap();
        let seq = inner.telemetry.len() as i64;
        inner.telemetry.push(TelemetryRecord {
            id: Uuid::new_v4(),
            machine_id,
            tire_id: None,
            pressure,
            speed,
            seq,
            recorded_at,
            created_at: Utc::now(),
        });
    }

    pub fn machine(&self, id: DbId) -> MachineSummary {
        self.inner
            .lock()
            .unwrap()
            .machines
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .expect("machine exists")
    }

    pub fn telemetry(&self) -> Vec<TelemetryRecord> {
        self.inner.lock().unwrap().telemetry.clone()
    }

    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.inner.lock().unwrap().alerts.clone()
    }

    pub fn audit_events(&self) -> Vec<NewAuditEvent> {
        self.inner.lock().unwrap().audit.clone()
    }

    fn visible(inner: &Inner, scope: &AccessScope, machine_id: DbId) -> bool {
        inner
            .members
            .iter()
            .any(|(id, subject)| *id == machine_id && *subject == scope.subject)
    }

    /// Newest first, capped at the window limit.
    fn newest<T: Clone>(rows: impl Iterator<Item = (Timestamp, T)>, limit: i64) -> Vec<T> {
        let mut rows: Vec<(Timestamp, T)> = rows.collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, row)| row)
            .collect()
    }
}

#[async_trait]
impl IngestStore for MemoryStore {
    async fn existing_machine_ids(&self, ids: &[DbId]) -> Result<Vec<DbId>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| inner.machines.iter().any(|m| m.id == *id))
            .collect())
    }

    async fn insert_telemetry(&self, rows: &[NewTelemetry]) -> Result<u64, StoreError> {
        injected(&self.fail_telemetry, "telemetry")?;
        let mut inner = self.inner.lock().unwrap();
        for row in rows {
            inner.telemetry.push(TelemetryRecord {
                id: Uuid::new_v4(),
                machine_id: row.machine_id,
                tire_id: row.tire_id,
                pressure: row.pressure,
                speed: row.speed,
                seq: row.seq,
                recorded_at: row.recorded_at,
                created_at: Utc::now(),
            });
        }
        Ok(rows.len() as u64)
    }

    async fn update_machine_state(&self, update: &MachineStateUpdate) -> Result<(), StoreError> {
        injected(&self.fail_machine_updates, "machine update")?;
        let mut inner = self.inner.lock().unwrap();
        if let Some(machine) = inner.machines.iter_mut().find(|m| m.id == update.machine_id) {
            machine.status = update.status.as_str().to_string();
            machine.last_telemetry_at = Some(update.last_telemetry_at);
        }
        Ok(())
    }

    async fn insert_alerts(&self, alerts: &[AlertDraft]) -> Result<u64, StoreError> {
        injected(&self.fail_alerts, "alert")?;
        let mut inner = self.inner.lock().unwrap();
        for alert in alerts {
            inner.alerts.push(AlertRecord {
                id: Uuid::new_v4(),
                machine_id: alert.machine_id,
                tire_id: alert.tire_id,
                alert_type: alert.alert_type.as_str().to_string(),
                severity: alert.severity.as_str().to_string(),
                status: alert.status.as_str().to_string(),
                message: alert.message.clone(),
                reason: Some(alert.reason.clone()),
                probable_cause: Some(alert.probable_cause.clone()),
                recommended_action: Some(alert.recommended_action.clone()),
                opened_at: alert.opened_at,
            });
        }
        Ok(alerts.len() as u64)
    }

    async fn append_audit_event(&self, event: &NewAuditEvent) -> Result<(), StoreError> {
        injected(&self.fail_audit, "audit")?;
        self.inner.lock().unwrap().audit.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl TimelineStore for MemoryStore {
    async fn find_machine(
        &self,
        scope: &AccessScope,
        machine_id: DbId,
    ) -> Result<Option<MachineSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        if !Self::visible(&inner, scope, machine_id) {
            return Ok(None);
        }
        Ok(inner.machines.iter().find(|m| m.id == machine_id).cloned())
    }

    async fn recent_alerts(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        injected(&self.fail_reads, "read")?;
        let inner = self.inner.lock().unwrap();
        if !Self::visible(&inner, scope, window.machine_id) {
            return Ok(Vec::new());
        }
        let rows = inner
            .alerts
            .iter()
            .filter(|a| a.machine_id == window.machine_id && in_window(window, a.opened_at))
            .map(|a| (a.opened_at, a.clone()));
        Ok(Self::newest(rows, window.limit))
    }

    async fn recent_occurrences(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<OccurrenceRecord>, StoreError> {
        injected(&self.fail_reads, "read")?;
        let inner = self.inner.lock().unwrap();
        if !Self::visible(&inner, scope, window.machine_id) {
            return Ok(Vec::new());
        }
        let rows = inner
            .occurrences
            .iter()
            .filter(|o| o.machine_id == window.machine_id && in_window(window, o.created_at))
            .map(|o| (o.created_at, o.clone()));
        Ok(Self::newest(rows, window.limit))
    }

    async fn recent_flagged_telemetry(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<TelemetryRecord>, StoreError> {
        injected(&self.fail_reads, "read")?;
        let inner = self.inner.lock().unwrap();
        if !Self::visible(&inner, scope, window.machine_id) {
            return Ok(Vec::new());
        }
        let rows = inner
            .telemetry
            .iter()
            .filter(|t| t.machine_id == window.machine_id && in_window(window, t.recorded_at))
            .filter(|t| fleetwatch_core::thresholds::is_flagged(t.pressure, t.speed))
            .map(|t| (t.recorded_at, t.clone()));
        Ok(Self::newest(rows, window.limit))
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        injected(&self.fail_reads, "health")
    }
}
