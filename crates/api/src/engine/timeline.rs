//! Timeline aggregation for one machine.
//!
//! The three sources are queried concurrently under the caller's access
//! scope, mapped to [`TimelineEvent`]s and merged newest first.

use std::time::Duration;

use fleetwatch_core::alert::Severity;
use fleetwatch_core::error::CoreError;
use fleetwatch_core::timeline::{
    alert_title, merge_timeline, telemetry_description, telemetry_grade, telemetry_limit,
    EventFilter, EventSource, TimelineEvent, OCCURRENCE_TITLE,
};
use fleetwatch_core::types::{DbId, Timestamp};
use fleetwatch_db::models::alert::AlertRecord;
use fleetwatch_db::models::machine::MachineSummary;
use fleetwatch_db::models::occurrence::OccurrenceRecord;
use fleetwatch_db::models::telemetry::TelemetryRecord;
use fleetwatch_db::{with_timeout, AccessScope, StoreError, TimelineStore, TimelineWindow};
use serde::Serialize;
use serde_json::json;

use crate::error::AppError;

/// A resolved timeline request.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineQuery {
    pub machine_id: DbId,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub filter: EventFilter,
    /// Already clamped to `[1, 500]`.
    pub limit: i64,
}

/// Response body of both timeline endpoints.
#[derive(Debug, Serialize)]
pub struct TimelineView {
    pub machine: MachineSummary,
    pub timeline: Vec<TimelineEvent>,
    /// Events fetched before the merged feed was cut to `limit`.
    pub total: usize,
}

/// Build the timeline of `query.machine_id` as seen by `scope`.
///
/// A machine the scope cannot see is reported exactly like a missing one.
pub async fn load_timeline<S>(
    store: &S,
    scope: &AccessScope,
    query: &TimelineQuery,
    store_timeout: Duration,
) -> Result<TimelineView, AppError>
where
    S: TimelineStore + ?Sized,
{
    let machine = with_timeout(store_timeout, store.find_machine(scope, query.machine_id))
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Machine",
            id: query.machine_id.to_string(),
        })?;

    let window = TimelineWindow {
        machine_id: query.machine_id,
        start: query.start,
        end: query.end,
        limit: query.limit,
    };
    let telemetry_window = window.capped(telemetry_limit(query.limit));

    let alerts = async {
        if !query.filter.includes(EventSource::Alert) {
            return Ok::<Vec<TimelineEvent>, StoreError>(Vec::new());
        }
        let rows = with_timeout(store_timeout, store.recent_alerts(scope, &window)).await?;
        Ok(rows.iter().map(alert_event).collect())
    };
    let occurrences = async {
        if !query.filter.includes(EventSource::Occurrence) {
            return Ok::<Vec<TimelineEvent>, StoreError>(Vec::new());
        }
        let rows = with_timeout(store_timeout, store.recent_occurrences(scope, &window)).await?;
        Ok(rows.iter().map(occurrence_event).collect())
    };
    let telemetry = async {
        if !query.filter.includes(EventSource::Telemetry) {
            return Ok::<Vec<TimelineEvent>, StoreError>(Vec::new());
        }
        let rows = with_timeout(
            store_timeout,
            store.recent_flagged_telemetry(scope, &telemetry_window),
        )
        .await?;
        Ok(rows.iter().map(telemetry_event).collect())
    };

    let (alerts, occurrences, telemetry) = tokio::try_join!(alerts, occurrences, telemetry)?;

    let limit = usize::try_from(query.limit).unwrap_or(0);
    let (timeline, total) = merge_timeline(vec![alerts, occurrences, telemetry], limit);

    tracing::debug!(
        machine_id = %query.machine_id,
        subject = %scope.subject,
        returned = timeline.len(),
        total,
        "Timeline assembled"
    );

    Ok(TimelineView {
        machine,
        timeline,
        total,
    })
}

pub fn alert_event(alert: &AlertRecord) -> TimelineEvent {
    TimelineEvent::new(
        EventSource::Alert,
        alert.id,
        alert_title(&alert.alert_type),
        alert.message.clone(),
        alert.opened_at,
    )
    .with_severity(Severity::parse(&alert.severity))
    .with_meta("alertType", alert.alert_type.clone())
    .with_meta("status", alert.status.clone())
    .with_meta("tireId", json!(alert.tire_id))
    .with_meta("reason", json!(alert.reason))
    .with_meta("probableCause", json!(alert.probable_cause))
    .with_meta("recommendedAction", json!(alert.recommended_action))
}

pub fn occurrence_event(occurrence: &OccurrenceRecord) -> TimelineEvent {
    TimelineEvent::new(
        EventSource::Occurrence,
        occurrence.id,
        OCCURRENCE_TITLE,
        occurrence.description.clone(),
        occurrence.created_at,
    )
    .with_meta("status", occurrence.status.clone())
    .with_meta("alertId", json!(occurrence.alert_id))
    .with_meta("tireId", json!(occurrence.tire_id))
}

pub fn telemetry_event(sample: &TelemetryRecord) -> TimelineEvent {
    let (title, severity) = telemetry_grade(sample.pressure, sample.speed);
    TimelineEvent::new(
        EventSource::Telemetry,
        sample.id,
        title,
        telemetry_description(sample.pressure, sample.speed),
        sample.recorded_at,
    )
    .with_severity(Some(severity))
    .with_meta("pressure", sample.pressure)
    .with_meta("speed", sample.speed)
    .with_meta("tireId", json!(sample.tire_id))
    .with_meta("seq", sample.seq)
}
