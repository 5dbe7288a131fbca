//! Forward-auth verification.
//!
//! Read-only: decodes the bearer, checks the subject claims and projects
//! them for the edge proxy. Every denial is logged with its precise kind.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::DenyReason;
use super::jwt::{DecodeOptions, TokenCodec};
use crate::models::auth::ForwardedIdentity;

/// Authorization scheme prefix.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, DenyReason> {
    let token = authorization
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(DenyReason::MissingOrMalformedHeader)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(DenyReason::MissingOrMalformedHeader);
    }
    Ok(token)
}

/// Verify an `Authorization` header value at `now`.
pub fn verify(
    codec: &TokenCodec,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ForwardedIdentity, DenyReason> {
    check(codec, authorization, now).inspect_err(|reason| {
        warn!(reason = %reason, "forward-auth denied");
    })
}

fn check(
    codec: &TokenCodec,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ForwardedIdentity, DenyReason> {
    let token = bearer_token(authorization)?;
    let decoded = codec.decode_at(token, DecodeOptions::STRICT, now)?;
    Ok(decoded.claims()?.into())
}
