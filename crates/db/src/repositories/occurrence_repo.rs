//! Repository for the `occurrences` table.

use sqlx::PgConnection;

use crate::models::occurrence::OccurrenceRecord;
use crate::store::TimelineWindow;

/// Column list for `occurrences` SELECT queries.
const COLUMNS: &str = "id, machine_id, alert_id, tire_id, description, status, created_at";

/// Provides timeline queries for occurrences.
pub struct OccurrenceRepo;

impl OccurrenceRepo {
    /// Occurrences for one machine inside the window, newest first.
    pub async fn list_recent(
        conn: &mut PgConnection,
        window: &TimelineWindow,
    ) -> Result<Vec<OccurrenceRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM occurrences \
             WHERE machine_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at <= $3) \
             ORDER BY created_at DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, OccurrenceRecord>(&query)
            .bind(window.machine_id)
            .bind(window.start)
            .bind(window.end)
            .bind(window.limit)
            .fetch_all(conn)
            .await
    }
}
