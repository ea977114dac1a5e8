//! Tire telemetry ingestion logic.
//!
//! - [`reading`] -- parse, validate and normalize one reading or a batch.
//! - [`classify`] -- map a normalized reading to zero or more alerts.
//! - [`machine_state`] -- fold a batch into one status update per machine.
//!
//! All logic in this module is pure (no DB access) so it can be tested in
//! isolation.

pub mod classify;
pub mod machine_state;
pub mod reading;

pub use classify::classify;
pub use machine_state::{determine_status, reduce_machine_states, MachineStateUpdate, MachineStatus};
pub use reading::{parse_readings, Reading, ReadingBatch, ReadingInput, MAX_BATCH_SIZE};
