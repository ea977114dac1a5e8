//! Credential extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fleetwatch_core::error::CoreError;
use fleetwatch_db::AccessScope;
use serde_json::Value;

use crate::auth::jwt::validate_token;
use crate::auth::{bearer_token, resolve_credential, Credential};
use crate::error::AppError;
use crate::state::AppState;

/// The credential that submitted an ingestion request: a device key or a
/// bearer token.
#[derive(Debug, Clone)]
pub struct IngestCredential(pub Credential);

impl FromRequestParts<AppState> for IngestCredential {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = resolve_credential(&parts.headers, &state.config)?;
        Ok(IngestCredential(credential))
    }
}

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(subject = %user.subject, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Token subject (`claims.sub`).
    pub subject: String,
    /// Every claim of the verified token.
    pub claims: Value,
}

impl AuthUser {
    /// The identity under which this user's reads are executed.
    pub fn scope(&self) -> AccessScope {
        AccessScope {
            subject: self.subject.clone(),
            claims: self.claims.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let verified = validate_token(token, &state.config.jwt).map_err(|e| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Invalid or expired token: {e}"
            )))
        })?;

        Ok(AuthUser {
            subject: verified.claims.sub,
            claims: verified.raw,
        })
    }
}
