//! Repository for the append-only `audit_events` table.

use sqlx::PgPool;

use crate::models::audit::NewAuditEvent;

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "action, source_kind, source_id, details";

/// Provides insert operations for audit events.
pub struct AuditEventRepo;

impl AuditEventRepo {
    pub async fn append(pool: &PgPool, event: &NewAuditEvent) -> Result<(), sqlx::Error> {
        let query = format!("INSERT INTO audit_events ({INSERT_COLUMNS}) VALUES ($1, $2, $3, $4)");
        sqlx::query(&query)
            .bind(&event.action)
            .bind(&event.source_kind)
            .bind(&event.source_id)
            .bind(&event.details)
            .execute(pool)
            .await?;
        Ok(())
    }
}
