//! Machine timeline read model.
//!
//! A timeline merges three independently fetched sources (alerts,
//! occurrences and flagged telemetry) into one feed sorted newest first.
//! Each source is capped before the merge and the merged feed is capped
//! again, so a source with more recent events can push another one out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::alert::{AlertType, Severity};
use crate::thresholds::{is_critical, pressure_out_of_band, SPEED_WARNING};
use crate::types::Timestamp;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;
/// Telemetry contributes at most this many events regardless of `limit`.
pub const TELEMETRY_CAP: i64 = 50;

/// Title used for alerts whose stored type is not a known [`AlertType`].
pub const FALLBACK_ALERT_TITLE: &str = "Alerta";
pub const OCCURRENCE_TITLE: &str = "Ocorrência registrada";

/// Where a timeline event came from. Serialized as the event `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Alert,
    Occurrence,
    Telemetry,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Alert => "alert",
            EventSource::Occurrence => "occurrence",
            EventSource::Telemetry => "telemetry",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alert" => Some(EventSource::Alert),
            "occurrence" => Some(EventSource::Occurrence),
            "telemetry" => Some(EventSource::Telemetry),
            _ => None,
        }
    }
}

/// One entry of the merged feed. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    /// `{source}-{source_id}`, unique across sources.
    pub id: String,
    #[serde(rename = "type")]
    pub source: EventSource,
    pub title: String,
    pub description: String,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub metadata: Map<String, Value>,
}

impl TimelineEvent {
    pub fn new(
        source: EventSource,
        source_id: impl std::fmt::Display,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: format!("{}-{source_id}", source.as_str()),
            source,
            title: title.into(),
            description: description.into(),
            timestamp,
            severity: None,
            metadata: Map::new(),
        }
    }

    pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Which sources a timeline request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub alerts: bool,
    pub occurrences: bool,
    pub telemetry: bool,
}

impl EventFilter {
    pub const ALL: EventFilter = EventFilter {
        alerts: true,
        occurrences: true,
        telemetry: true,
    };

    /// Parse a comma-separated `eventTypes` value.
    ///
    /// Unknown names are dropped; if nothing valid remains (or the value is
    /// absent) every source is selected.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut filter = EventFilter {
            alerts: false,
            occurrences: false,
            telemetry: false,
        };
        let mut any = false;
        for name in raw.unwrap_or_default().split(',') {
            match EventSource::parse(name.trim()) {
                Some(EventSource::Alert) => filter.alerts = true,
                Some(EventSource::Occurrence) => filter.occurrences = true,
                Some(EventSource::Telemetry) => filter.telemetry = true,
                None => continue,
            }
            any = true;
        }
        if any {
            filter
        } else {
            Self::ALL
        }
    }

    pub fn includes(&self, source: EventSource) -> bool {
        match source {
            EventSource::Alert => self.alerts,
            EventSource::Occurrence => self.occurrences,
            EventSource::Telemetry => self.telemetry,
        }
    }
}

/// Resolve the `limit` query value: default 100, clamped to `[1, 500]`.
/// Unparsable values fall back to the default.
pub fn clamp_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, MAX_LIMIT)
}

/// Per-source cap for telemetry given the request limit.
pub fn telemetry_limit(limit: i64) -> i64 {
    limit.min(TELEMETRY_CAP)
}

/// Parse a `startDate` / `endDate` value.
///
/// Accepts a full RFC 3339 instant or a plain `YYYY-MM-DD` date (midnight
/// UTC).
pub fn parse_date_param(value: &str) -> Option<Timestamp> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Title for an alert event, from its stored type name.
pub fn alert_title(alert_type: &str) -> &'static str {
    AlertType::parse(alert_type)
        .map(|t| t.label())
        .unwrap_or(FALLBACK_ALERT_TITLE)
}

/// Title and severity for a telemetry sample shown on the timeline.
///
/// Critical limits win over everything; below that, an out-of-band pressure
/// outranks an elevated speed.
pub fn telemetry_grade(pressure: f64, speed: f64) -> (&'static str, Severity) {
    if is_critical(pressure, speed) {
        ("Leitura crítica de telemetria", Severity::Critical)
    } else if pressure_out_of_band(pressure) {
        ("Pressão fora da faixa ideal", Severity::High)
    } else if speed > SPEED_WARNING {
        ("Velocidade acima do recomendado", Severity::Medium)
    } else {
        ("Leitura de telemetria", Severity::Low)
    }
}

/// Description for a telemetry sample shown on the timeline.
pub fn telemetry_description(pressure: f64, speed: f64) -> String {
    format!("Pressão: {pressure:.1} bar | Velocidade: {speed:.1} km/h")
}

/// Concatenate per-source events, sort newest first and keep `limit`.
///
/// Returns the kept events and the number of events before truncation.
/// The sort is stable, so events with equal timestamps keep source order.
pub fn merge_timeline(sources: Vec<Vec<TimelineEvent>>, limit: usize) -> (Vec<TimelineEvent>, usize) {
    let mut events: Vec<TimelineEvent> = sources.into_iter().flatten().collect();
    let total = events.len();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    (events, total)
}
