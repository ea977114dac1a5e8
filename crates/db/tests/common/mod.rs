//! Seeding helpers shared by the database integration tests.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use fleetwatch_core::types::{DbId, Timestamp};
use fleetwatch_db::models::telemetry::NewTelemetry;
use sqlx::PgPool;
use uuid::Uuid;

/// Whole seconds so values survive the round trip through `timestamptz`.
pub fn at(minutes: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub async fn seed_machine(pool: &PgPool, organization_id: Uuid, name: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO machines (organization_id, name) VALUES ($1, $2) RETURNING id")
        .bind(organization_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_member(pool: &PgPool, organization_id: Uuid, user_id: &str) {
    sqlx::query("INSERT INTO organization_members (organization_id, user_id) VALUES ($1, $2)")
        .bind(organization_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_occurrence(pool: &PgPool, machine_id: DbId, description: &str, created_at: Timestamp) {
    sqlx::query("INSERT INTO occurrences (machine_id, description, created_at) VALUES ($1, $2, $3)")
        .bind(machine_id)
        .bind(description)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
}

pub fn sample(machine_id: DbId, pressure: f64, speed: f64, minutes: i64) -> NewTelemetry {
    NewTelemetry {
        machine_id,
        tire_id: None,
        pressure,
        speed,
        seq: minutes,
        recorded_at: at(minutes),
    }
}
