//! Per-machine status derived from a batch of readings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::telemetry::reading::Reading;
use crate::thresholds::{is_critical, is_flagged};
use crate::types::{DbId, Timestamp};

/// Aggregate operational classification stored on the machine row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Operational,
    Warning,
    Critical,
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Operational => "operational",
            MachineStatus::Warning => "warning",
            MachineStatus::Critical => "critical",
        }
    }
}

/// The state write produced for one machine by one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineStateUpdate {
    pub machine_id: DbId,
    pub status: MachineStatus,
    pub last_telemetry_at: Timestamp,
}

/// Status for a single reading. Depends on nothing but the two values.
pub fn determine_status(pressure: f64, speed: f64) -> MachineStatus {
    if is_critical(pressure, speed) {
        MachineStatus::Critical
    } else if is_flagged(pressure, speed) {
        MachineStatus::Warning
    } else {
        MachineStatus::Operational
    }
}

/// Reduce a batch to one update per distinct machine.
///
/// The representative reading is the one with the greatest `timestamp`
/// (`seq` is ignored); on equal timestamps the later reading in the batch
/// wins. Updates come out in order of each machine's first appearance.
pub fn reduce_machine_states(readings: &[Reading]) -> Vec<MachineStateUpdate> {
    let mut latest: IndexMap<DbId, &Reading> = IndexMap::new();

    for reading in readings {
        latest
            .entry(reading.machine_id)
            .and_modify(|current| {
                if reading.timestamp >= current.timestamp {
                    *current = reading;
                }
            })
            .or_insert(reading);
    }

    latest
        .into_values()
        .map(|r| MachineStateUpdate {
            machine_id: r.machine_id,
            status: determine_status(r.pressure, r.speed),
            last_telemetry_at: r.timestamp,
        })
        .collect()
}
