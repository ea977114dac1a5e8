//! Fallback shared by every endpoint for methods it does not serve.
//!
//! OPTIONS never reaches the router: the CORS layer answers every OPTIONS
//! request with an empty 200 and the allow headers.

use axum::http::Method;

use crate::error::AppError;

/// Fallback for any method a route does not register.
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}
