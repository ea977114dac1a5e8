//! Request engines.
//!
//! Handlers stay thin: they resolve credentials and parameters, then hand
//! off to these functions, which are written against the storage traits so
//! they run unchanged over PostgreSQL or an in-memory store.

pub mod ingest;
pub mod timeline;
