//! Repository for the `telemetry` table (append-only time-series).

use fleetwatch_core::thresholds::{PRESSURE_WARNING_HIGH, PRESSURE_WARNING_LOW, SPEED_WARNING};
use sqlx::{PgConnection, PgPool};

use crate::models::telemetry::{NewTelemetry, TelemetryRecord};
use crate::store::TimelineWindow;

/// Column list for `telemetry` SELECT queries.
const COLUMNS: &str = "\
    id, machine_id, tire_id, pressure, speed, seq, recorded_at, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "machine_id, tire_id, pressure, speed, seq, recorded_at";

/// Number of bound parameters per inserted row.
const INSERT_ARITY: usize = 6;

/// Provides query operations for telemetry.
pub struct TelemetryRepo;

impl TelemetryRepo {
    /// Batch-insert telemetry rows with a single multi-row INSERT.
    ///
    /// A single statement is atomic, so either every row lands or none do.
    pub async fn insert_batch(pool: &PgPool, rows: &[NewTelemetry]) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "INSERT INTO telemetry ({INSERT_COLUMNS}) VALUES {}",
            values_placeholders(rows.len(), INSERT_ARITY)
        );

        let mut q = sqlx::query(&query);
        for row in rows {
            q = q
                .bind(row.machine_id)
                .bind(row.tire_id)
                .bind(row.pressure)
                .bind(row.speed)
                .bind(row.seq)
                .bind(row.recorded_at);
        }

        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Telemetry outside the warning band for one machine, newest first.
    ///
    /// Only rows with `pressure < 2.5 OR pressure > 4.5 OR speed > 60`
    /// are eligible.
    pub async fn list_flagged(
        conn: &mut PgConnection,
        window: &TimelineWindow,
    ) -> Result<Vec<TelemetryRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM telemetry \
             WHERE machine_id = $1 \
               AND ($2::timestamptz IS NULL OR recorded_at >= $2) \
               AND ($3::timestamptz IS NULL OR recorded_at <= $3) \
               AND (pressure < $4 OR pressure > $5 OR speed > $6) \
             ORDER BY recorded_at DESC \
             LIMIT $7"
        );
        sqlx::query_as::<_, TelemetryRecord>(&query)
            .bind(window.machine_id)
            .bind(window.start)
            .bind(window.end)
            .bind(PRESSURE_WARNING_LOW)
            .bind(PRESSURE_WARNING_HIGH)
            .bind(SPEED_WARNING)
            .bind(window.limit)
            .fetch_all(conn)
            .await
    }
}

/// Build `($1, $2, ...), ($n, ...)` for a multi-row INSERT.
pub(crate) fn values_placeholders(rows: usize, arity: usize) -> String {
    let mut out = String::with_capacity(rows * arity * 5);
    let mut param_idx = 1usize;
    for i in 0..rows {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for j in 0..arity {
            if j > 0 {
                out.push_str(", ");
            }
            out.push('$');
            out.push_str(&param_idx.to_string());
            param_idx += 1;
        }
        out.push(')');
    }
    out
}
