//! Repository for the `machines` table.

use fleetwatch_core::telemetry::MachineStateUpdate;
use fleetwatch_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::machine::MachineSummary;

/// Column list for the timeline machine summary.
const SUMMARY_COLUMNS: &str = "id, name, model, status, last_telemetry_at";

/// Provides query operations for machines.
pub struct MachineRepo;

impl MachineRepo {
    /// Return which of `ids` exist.
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, DbId>("SELECT id FROM machines WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Overwrite status and `last_telemetry_at` unconditionally.
    ///
    /// There is no comparison against the stored `last_telemetry_at`; a
    /// batch with older timestamps moves it backward.
    pub async fn apply_state(pool: &PgPool, update: &MachineStateUpdate) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE machines \
             SET status = $2, last_telemetry_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(update.machine_id)
        .bind(update.status.as_str())
        .bind(update.last_telemetry_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a machine summary on a scoped connection.
    pub async fn find_summary(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MachineSummary>, sqlx::Error> {
        let query = format!("SELECT {SUMMARY_COLUMNS} FROM machines WHERE id = $1");
        sqlx::query_as::<_, MachineSummary>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
