use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use fleetwatch_core::error::CoreError;
use fleetwatch_db::StoreError;
use serde_json::{json, Value};

/// Message returned for every 401, whatever the underlying reason.
pub const UNAUTHORIZED_MESSAGE: &str = "Missing or invalid credentials";

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for persistence
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce the `{ "error", "code" }` JSON envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `fleetwatch_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage failure. Always a 500 with a sanitized message.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut extra: Option<(&'static str, Value)> = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidFields(errors) => {
                    extra = Some(("details", json!(errors)));
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Invalid telemetry payload".to_string(),
                    )
                }
                CoreError::UnknownMachines(ids) => {
                    extra = Some(("invalidIds", json!(ids)));
                    (
                        StatusCode::BAD_REQUEST,
                        "UNKNOWN_MACHINES",
                        "One or more machines do not exist".to_string(),
                    )
                }
                CoreError::Unauthorized(reason) => {
                    tracing::debug!(reason = %reason, "Rejected credentials");
                    (
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        UNAUTHORIZED_MESSAGE.to_string(),
                    )
                }
            },

            // --- Store errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::MethodNotAllowed(method) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                format!("Method {method} not allowed"),
            ),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some((key, value)) = extra {
            body[key] = value;
        }

        (status, axum::Json(body)).into_response()
    }
}
