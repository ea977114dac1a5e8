//! Fleetwatch API server library.
//!
//! Exposes config, state, auth, request engines and routes so the binary
//! entrypoint and the integration tests build the exact same application.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
