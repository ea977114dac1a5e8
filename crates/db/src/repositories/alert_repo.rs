//! Repository for the `alerts` table.

use fleetwatch_core::alert::AlertDraft;
use sqlx::{PgConnection, PgPool};

use super::telemetry_repo::values_placeholders;
use crate::models::alert::AlertRecord;
use crate::store::TimelineWindow;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `alerts` SELECT queries.
const COLUMNS: &str = "\
    id, machine_id, tire_id, type, severity, status, message, reason, \
    probable_cause, recommended_action, opened_at";

/// Column list for INSERT (excludes auto-generated `id`).
const INSERT_COLUMNS: &str = "\
    machine_id, tire_id, type, severity, status, message, reason, \
    probable_cause, recommended_action, opened_at";

const INSERT_ARITY: usize = 10;

// ---------------------------------------------------------------------------
// AlertRepo
// ---------------------------------------------------------------------------

/// Provides insert and timeline queries for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Batch insert classified alerts in one statement.
    pub async fn insert_batch(pool: &PgPool, alerts: &[AlertDraft]) -> Result<u64, sqlx::Error> {
        if alerts.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "INSERT INTO alerts ({INSERT_COLUMNS}) VALUES {}",
            values_placeholders(alerts.len(), INSERT_ARITY)
        );

        let mut q = sqlx::query(&query);
        for alert in alerts {
            q = q
                .bind(alert.machine_id)
                .bind(alert.tire_id)
                .bind(alert.alert_type.as_str())
                .bind(alert.severity.as_str())
                .bind(alert.status.as_str())
                .bind(&alert.message)
                .bind(&alert.reason)
                .bind(&alert.probable_cause)
                .bind(&alert.recommended_action)
                .bind(alert.opened_at);
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Alerts for one machine inside the window, newest `opened_at` first.
    pub async fn list_recent(
        conn: &mut PgConnection,
        window: &TimelineWindow,
    ) -> Result<Vec<AlertRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE machine_id = $1 \
               AND ($2::timestamptz IS NULL OR opened_at >= $2) \
               AND ($3::timestamptz IS NULL OR opened_at <= $3) \
             ORDER BY opened_at DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, AlertRecord>(&query)
            .bind(window.machine_id)
            .bind(window.start)
            .bind(window.end)
            .bind(window.limit)
            .fetch_all(conn)
            .await
    }
}
