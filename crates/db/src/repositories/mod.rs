//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Privileged writes take `&PgPool`; timeline reads take a
//! `&mut PgConnection` that already carries the caller's access scope.

pub mod alert_repo;
pub mod audit_repo;
pub mod machine_repo;
pub mod occurrence_repo;
pub mod telemetry_repo;

pub use alert_repo::AlertRepo;
pub use audit_repo::AuditEventRepo;
pub use machine_repo::MachineRepo;
pub use occurrence_repo::OccurrenceRepo;
pub use telemetry_repo::TelemetryRepo;
