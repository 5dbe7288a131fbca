//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use meshauth_core::models::auth::ForwardedIdentity;

use crate::AppState;
use crate::error::AppError;

/// Key used to store the verified identity in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub ForwardedIdentity);

/// Raw `Authorization` header value. Non-UTF-8 values count as absent.
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Axum middleware: verifies `Authorization: Bearer <token>` and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = state
        .auth
        .verify(authorization_header(request.headers()))
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}
