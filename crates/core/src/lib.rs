//! Domain logic for fleet tire telemetry.
//!
//! Everything in this crate is pure: reading validation, threshold
//! classification, per-machine state reduction and timeline assembly. The
//! `db` crate persists what these modules produce and the `api` crate
//! sequences them per request.

pub mod alert;
pub mod error;
pub mod telemetry;
pub mod thresholds;
pub mod timeline;
pub mod types;
