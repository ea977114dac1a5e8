//! Authentication extractors.
//!
//! - [`auth::IngestCredential`] -- device key or bearer token, for ingestion.
//! - [`auth::AuthUser`] -- bearer token only, for timeline reads.

pub mod auth;
