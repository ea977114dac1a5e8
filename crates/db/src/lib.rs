//! PostgreSQL persistence for fleet telemetry.
//!
//! - [`models`] -- row structs and insert DTOs.
//! - [`repositories`] -- zero-sized query structs, one per table.
//! - [`store`] -- the storage traits the request engines are written against.
//! - [`pg_store`] -- the sqlx implementation of those traits.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod store;

pub use pg_store::PgStore;
pub use store::{
    with_timeout, AccessScope, FleetStore, IngestStore, StoreError, TimelineStore, TimelineWindow,
};

pub type DbPool = sqlx::PgPool;

/// How long a request may wait for a free connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
