//! HTTP-level tests for `POST /api/v1/telemetry/ingest`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{build_test_app, ingest, send, user_token, MemoryStore, DEVICE_KEY};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: a critical reading stores telemetry, two alerts and a critical status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn critical_reading_creates_two_alerts() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 12");

    let body = json!({ "machineId": machine, "pressure": 1.8, "speed": 90 }).to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["processed"], 1);
    assert_eq!(json["alerts_generated"], 2);
    assert!(json["timestamp"].is_string());

    assert_eq!(store.telemetry().len(), 1);

    let alerts = store.alerts();
    let kinds: Vec<(&str, &str)> = alerts
        .iter()
        .map(|a| (a.alert_type.as_str(), a.severity.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![("pressure_low", "critical"), ("speed_exceeded", "critical")]
    );
    assert!(alerts.iter().all(|a| a.status == "open"));

    assert_eq!(store.machine(machine).status, "critical");
}

// ---------------------------------------------------------------------------
// Test: the newest reading decides machine state, every reading classifies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn latest_reading_sets_machine_state() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 7");

    let body = json!({ "readings": [
        { "machineId": machine, "pressure": 3.0, "speed": 30, "timestamp": "2024-05-01T10:00:00Z" },
        { "machineId": machine, "pressure": 1.5, "speed": 30, "timestamp": "2024-05-01T10:05:00Z" },
        { "machineId": machine, "pressure": 3.0, "speed": 30, "timestamp": "2024-05-01T10:10:00Z" },
    ]})
    .to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["processed"], 3);
    assert_eq!(json["alerts_generated"], 1);

    let state = store.machine(machine);
    assert_eq!(state.status, "operational");
    assert_eq!(
        state.last_telemetry_at.unwrap().to_rfc3339(),
        "2024-05-01T10:10:00+00:00"
    );
    assert_eq!(store.alerts()[0].alert_type, "pressure_low");
}

// ---------------------------------------------------------------------------
// Test: resubmitting a batch duplicates rows and alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_batches_are_not_deduplicated() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 3");
    let body = json!({
        "machineId": machine,
        "pressure": 2.3,
        "speed": 10,
        "timestamp": "2024-05-01T10:00:00Z",
        "seq": 41
    })
    .to_string();

    for _ in 0..2 {
        let (status, _) = ingest(build_test_app(store.clone()), &body).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(store.telemetry().len(), 2);
    assert!(store.telemetry().iter().all(|t| t.seq == 41));
    assert_eq!(store.alerts().len(), 2);
}

// ---------------------------------------------------------------------------
// Test: unknown machine ids reject the whole batch before any write
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_machine_rejects_batch() {
    let store = MemoryStore::new();
    let known = store.add_machine("Caminhão 1");
    let unknown = uuid::Uuid::new_v4();

    let body = json!({ "readings": [
        { "machineId": known, "pressure": 1.0, "speed": 10 },
        { "machineId": unknown, "pressure": 3.0, "speed": 10 },
    ]})
    .to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "UNKNOWN_MACHINES");
    assert_eq!(json["invalidIds"], json!([unknown]));
    assert!(store.telemetry().is_empty());
    assert!(store.alerts().is_empty());
    assert!(store.audit_events().is_empty());
}

// ---------------------------------------------------------------------------
// Test: field errors are reported with wire paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_fields_return_details() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 1");

    let body = json!({ "readings": [
        { "machineId": machine, "pressure": 3.0, "speed": 10 },
        { "machineId": machine, "pressure": 12.0, "speed": 10 },
    ]})
    .to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["details"][0]["path"], "readings.1.pressure");
    assert!(store.telemetry().is_empty());
}

#[tokio::test]
async fn missing_field_is_reported_with_item_index() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 1");

    let body = json!({ "readings": [
        { "machineId": machine, "pressure": 3.0, "speed": 10 },
        { "machineId": machine, "pressure": 3.0 },
    ]})
    .to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["path"], "readings.1.speed");
    assert!(store.telemetry().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_body_error() {
    let (status, json) = ingest(build_test_app(MemoryStore::new()), "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["path"], "body");
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let (status, json) = ingest(build_test_app(MemoryStore::new()), r#"{"readings":[]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["path"], "readings");
}

// ---------------------------------------------------------------------------
// Test: credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_credentials_return_401() {
    let request = Request::post("/api/v1/telemetry/ingest")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(build_test_app(MemoryStore::new()), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn wrong_device_key_returns_401() {
    let request = Request::post("/api/v1/telemetry/ingest")
        .header("x-device-key", "not-the-key")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(build_test_app(MemoryStore::new()), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_token_is_accepted_and_audited() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 9");

    let body = json!({ "machineId": machine, "pressure": 3.2, "speed": 40 }).to_string();
    let request = Request::post("/api/v1/telemetry/ingest")
        .header("authorization", format!("Bearer {}", user_token("operator-1")))
        .body(Body::from(body))
        .unwrap();
    let (status, json) = send(build_test_app(store.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["alerts_generated"], 0);

    let audit = store.audit_events();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "telemetry.ingest");
    assert_eq!(audit[0].source_kind, "user");
    assert_eq!(audit[0].source_id, "operator-1");
    assert_eq!(audit[0].details["processed"], 1);
}

#[tokio::test]
async fn device_audit_never_records_the_key() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 9");

    let body = json!({ "machineId": machine, "pressure": 3.2, "speed": 40 }).to_string();
    let (status, _) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::OK);
    let audit = store.audit_events();
    assert_eq!(audit[0].source_kind, "device");
    assert_ne!(audit[0].source_id, DEVICE_KEY);
    assert_eq!(audit[0].source_id.len(), 8);
}

// ---------------------------------------------------------------------------
// Test: failure asymmetry between the telemetry insert and later writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn telemetry_insert_failure_returns_500() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 2");
    MemoryStore::fail(&store.fail_telemetry);

    let body = json!({ "machineId": machine, "pressure": 1.0, "speed": 10 }).to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
    assert!(store.alerts().is_empty());
    assert_eq!(store.machine(machine).status, "operational");
}

#[tokio::test]
async fn degraded_writes_still_succeed() {
    let store = MemoryStore::new();
    let machine = store.add_machine("Caminhão 2");
    MemoryStore::fail(&store.fail_alerts);
    MemoryStore::fail(&store.fail_machine_updates);
    MemoryStore::fail(&store.fail_audit);

    let body = json!({ "machineId": machine, "pressure": 1.0, "speed": 95 }).to_string();
    let (status, json) = ingest(build_test_app(store.clone()), &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["alerts_generated"], 2);
    assert_eq!(store.telemetry().len(), 1);
    assert!(store.alerts().is_empty());
    assert!(store.audit_events().is_empty());
    assert_eq!(store.machine(machine).status, "operational");
}

// ---------------------------------------------------------------------------
// Test: method handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_is_method_not_allowed() {
    let request = Request::get("/api/v1/telemetry/ingest")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(build_test_app(MemoryStore::new()), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn bare_options_returns_empty_200() {
    let request = Request::options("/api/v1/telemetry/ingest")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(build_test_app(MemoryStore::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.is_null());
}
