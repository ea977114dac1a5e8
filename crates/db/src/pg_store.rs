//! sqlx implementation of the storage traits.
//!
//! Ingestion writes go straight to the pool. Every timeline read runs in its
//! own short transaction that first switches to the row-level-security role
//! and publishes the caller's claims through `set_config`, so the policies in
//! `db/migrations` decide which machines are visible.

use async_trait::async_trait;
use fleetwatch_core::alert::AlertDraft;
use fleetwatch_core::telemetry::MachineStateUpdate;
use fleetwatch_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::alert::AlertRecord;
use crate::models::audit::NewAuditEvent;
use crate::models::machine::MachineSummary;
use crate::models::occurrence::OccurrenceRecord;
use crate::models::telemetry::{NewTelemetry, TelemetryRecord};
use crate::repositories::{AlertRepo, AuditEventRepo, MachineRepo, OccurrenceRepo, TelemetryRepo};
use crate::store::{
    AccessScope, FleetStore, IngestStore, StoreError, TimelineStore, TimelineWindow,
};

/// PostgreSQL-backed [`FleetStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    rls_role: String,
}

impl PgStore {
    pub fn new(pool: PgPool, rls_role: impl Into<String>) -> Self {
        Self {
            pool,
            rls_role: rls_role.into(),
        }
    }

    /// Open a transaction whose statements run under the caller's identity.
    ///
    /// The settings are transaction-local and vanish on commit or rollback,
    /// so the pooled connection goes back clean.
    async fn begin_scoped(
        &self,
        scope: &AccessScope,
    ) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "SELECT set_config('role', $1, true), \
                    set_config('request.jwt.claims', $2, true), \
                    set_config('request.jwt.claim.sub', $3, true)",
        )
        .bind(&self.rls_role)
        .bind(scope.claims.to_string())
        .bind(&scope.subject)
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }
}

#[async_trait]
impl IngestStore for PgStore {
    async fn existing_machine_ids(&self, ids: &[DbId]) -> Result<Vec<DbId>, StoreError> {
        Ok(MachineRepo::existing_ids(&self.pool, ids).await?)
    }

    async fn insert_telemetry(&self, rows: &[NewTelemetry]) -> Result<u64, StoreError> {
        Ok(TelemetryRepo::insert_batch(&self.pool, rows).await?)
    }

    async fn update_machine_state(&self, update: &MachineStateUpdate) -> Result<(), StoreError> {
        Ok(MachineRepo::apply_state(&self.pool, update).await?)
    }

    async fn insert_alerts(&self, alerts: &[AlertDraft]) -> Result<u64, StoreError> {
        Ok(AlertRepo::insert_batch(&self.pool, alerts).await?)
    }

    async fn append_audit_event(&self, event: &NewAuditEvent) -> Result<(), StoreError> {
        Ok(AuditEventRepo::append(&self.pool, event).await?)
    }
}

#[async_trait]
impl TimelineStore for PgStore {
    async fn find_machine(
        &self,
        scope: &AccessScope,
        machine_id: DbId,
    ) -> Result<Option<MachineSummary>, StoreError> {
        let mut tx = self.begin_scoped(scope).await?;
        let machine = MachineRepo::find_summary(&mut *tx, machine_id).await?;
        tx.commit().await?;
        Ok(machine)
    }

    async fn recent_alerts(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let mut tx = self.begin_scoped(scope).await?;
        let rows = AlertRepo::list_recent(&mut *tx, window).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn recent_occurrences(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<OccurrenceRecord>, StoreError> {
        let mut tx = self.begin_scoped(scope).await?;
        let rows = OccurrenceRepo::list_recent(&mut *tx, window).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn recent_flagged_telemetry(
        &self,
        scope: &AccessScope,
        window: &TimelineWindow,
    ) -> Result<Vec<TelemetryRecord>, StoreError> {
        let mut tx = self.begin_scoped(scope).await?;
        let rows = TelemetryRepo::list_flagged(&mut *tx, window).await?;
        tx.commit().await?;
        Ok(rows)
    }
}

#[async_trait]
impl FleetStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
