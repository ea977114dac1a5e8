//! Authentication primitives.
//!
//! - [`jwt`] -- bearer token issuance and verification.
//! - [`device`] -- shared-secret device key checks.
//!
//! Ingestion accepts either credential shape; [`resolve_credential`] decides
//! which one a request carries.

pub mod device;
pub mod jwt;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use fleetwatch_core::error::CoreError;

use crate::config::ServerConfig;

/// Header carrying the device shared secret.
pub const DEVICE_KEY_HEADER: &str = "x-device-key";

/// Who submitted a telemetry batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// A field device holding the shared key.
    Device { fingerprint: String },
    /// A user with a verified bearer token.
    User { subject: String },
}

impl Credential {
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Device { .. } => "device",
            Credential::User { .. } => "user",
        }
    }

    /// Fingerprint or subject, recorded in the audit trail.
    pub fn source_id(&self) -> &str {
        match self {
            Credential::Device { fingerprint } => fingerprint,
            Credential::User { subject } => subject,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, CoreError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
    })
}

/// Resolve the credential of an ingestion request.
///
/// A device key that matches wins. Otherwise a valid bearer token is
/// required, so a wrong device key with no token is a 401.
pub fn resolve_credential(
    headers: &HeaderMap,
    config: &ServerConfig,
) -> Result<Credential, CoreError> {
    let presented = headers
        .get(DEVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty());

    if let (Some(presented), Some(expected)) = (presented, config.device_api_key.as_deref()) {
        if device::verify_device_key(presented, expected) {
            return Ok(Credential::Device {
                fingerprint: device::fingerprint(presented),
            });
        }
    }

    let token = match bearer_token(headers) {
        Ok(token) => token,
        Err(_) if presented.is_some() => {
            return Err(CoreError::Unauthorized("Invalid device key".into()))
        }
        Err(err) => return Err(err),
    };

    let verified = jwt::validate_token(token, &config.jwt)
        .map_err(|e| CoreError::Unauthorized(format!("Invalid or expired token: {e}")))?;

    Ok(Credential::User {
        subject: verified.claims.sub,
    })
}
