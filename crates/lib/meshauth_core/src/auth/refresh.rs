//! Token refresh.
//!
//! Accepts an authentic token even after expiry and re-issues it with fresh
//! `iat`/`exp`. The refresh window is counted from the original
//! authentication (`authTime`), which every refreshed token carries forward,
//! so chained refreshes cannot outlive it. Never touches the user store.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::jwt::{DecodeOptions, TokenCodec};
use super::verification::bearer_token;
use super::{AuthError, DenyReason, TokenPolicy};
use crate::models::auth::{IssuedToken, TokenClaims};

/// Refresh the bearer in `authorization` at `now`.
///
/// `userId`, `email`, `role` and `authTime` are carried forward.
pub fn refresh(
    codec: &TokenCodec,
    policy: TokenPolicy,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    let (claims, authenticated_at) = match accept(codec, policy, authorization, now) {
        Ok(accepted) => accepted,
        Err(reason) => {
            warn!(reason = %reason, "token refresh denied");
            return Err(reason.into());
        }
    };
    codec.reissue_at(&claims, authenticated_at, policy.ttl, now)
}

fn accept(
    codec: &TokenCodec,
    policy: TokenPolicy,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(TokenClaims, DateTime<Utc>), DenyReason> {
    let token = bearer_token(authorization)?;
    let decoded = codec.decode_at(token, DecodeOptions::IGNORE_EXPIRY, now)?;
    let claims = decoded.claims()?;

    // Past the representable range counts as elapsed.
    let elapsed = decoded
        .authenticated_at
        .checked_add_signed(policy.refresh_window)
        .is_none_or(|deadline| now > deadline);
    if elapsed {
        return Err(DenyReason::RefreshWindowElapsed);
    }
    Ok((claims, decoded.authenticated_at))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::auth::TokenError;
    use crate::auth::jwt::ALGORITHM;

    const SECRET: &[u8] = b"refresh-test-secret-0123456789abcdefgh";

    fn codec() -> TokenCodec {
        TokenCodec::from_secret(SECRET)
    }

    fn policy() -> TokenPolicy {
        TokenPolicy {
            ttl: Duration::minutes(15),
            refresh_window: Duration::days(7),
        }
    }

    fn claims(role: Option<&str>) -> TokenClaims {
        TokenClaims {
            user_id: "u-1".into(),
            email: "a@x.com".into(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn expired_token_is_exchanged_for_a_later_one() {
        let issued_at = Utc::now() - Duration::hours(1);
        let old = codec().issue_at(&claims(None), Duration::minutes(15), issued_at).unwrap();

        let now = Utc::now();
        let header = format!("Bearer {}", old.token);
        let fresh = refresh(&codec(), policy(), Some(&header), now).unwrap();

        assert!(fresh.expires_at > old.expires_at);
        assert_eq!(fresh.claims, old.claims);
        let decoded = codec().decode_at(&fresh.token, DecodeOptions::STRICT, now).unwrap();
        assert_eq!(decoded.claims().unwrap().email, "a@x.com");
    }

    #[test]
    fn role_survives_refresh() {
        let old = codec().issue_at(&claims(Some("admin")), Duration::minutes(1), Utc::now()).unwrap();
        let header = format!("Bearer {}", old.token);
        let fresh = refresh(&codec(), policy(), Some(&header), Utc::now()).unwrap();
        assert_eq!(fresh.claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let old = codec().issue(&claims(None), Duration::minutes(1)).unwrap();
        let other = TokenCodec::from_secret(b"another-secret");
        let header = format!("Bearer {}", old.token);
        let err = refresh(&other, policy(), Some(&header), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Denied(DenyReason::Token(TokenError::InvalidSignature))
        ));
    }

    #[test]
    fn malformed_or_missing_header_is_rejected() {
        for header in [None, Some("Bearer nope"), Some("Token abc")] {
            let err = refresh(&codec(), policy(), header, Utc::now()).unwrap_err();
            assert!(matches!(err, AuthError::Denied(_)), "header {header:?}");
        }
    }

    #[test]
    fn token_past_refresh_window_is_rejected() {
        let issued_at = Utc::now() - Duration::days(30);
        let old = codec().issue_at(&claims(None), Duration::minutes(15), issued_at).unwrap();
        let header = format!("Bearer {}", old.token);
        let err = refresh(&codec(), policy(), Some(&header), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Denied(DenyReason::RefreshWindowElapsed)
        ));
    }

    #[test]
    fn chained_refreshes_stop_at_window_from_first_login() {
        // Whole seconds, matching the token's timestamp resolution.
        let login_at = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap() - Duration::days(30);
        let mut current = codec().issue_at(&claims(None), Duration::minutes(15), login_at).unwrap();

        // Refresh once a day: each hop is well inside the window measured
        // from the previous token, but the session started at `login_at`.
        let mut now = login_at;
        let mut refreshed = 0;
        let err = loop {
            now += Duration::days(1);
            let header = format!("Bearer {}", current.token);
            match refresh(&codec(), policy(), Some(&header), now) {
                Ok(next) => {
                    assert_eq!(next.authenticated_at.timestamp(), login_at.timestamp());
                    current = next;
                    refreshed += 1;
                }
                Err(err) => break err,
            }
        };

        assert_eq!(refreshed, 7);
        assert!(now > login_at + policy().refresh_window);
        assert!(matches!(
            err,
            AuthError::Denied(DenyReason::RefreshWindowElapsed)
        ));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let login_at = Utc::now() - Duration::days(10);
        let old = codec().issue_at(&claims(None), Duration::minutes(15), login_at).unwrap();
        let header = format!("Bearer {}", old.token);
        let deadline = old.authenticated_at + policy().refresh_window;

        assert!(refresh(&codec(), policy(), Some(&header), deadline).is_ok());
        assert!(refresh(&codec(), policy(), Some(&header), deadline + Duration::seconds(1)).is_err());
    }

    #[test]
    fn token_without_user_id_is_missing_claims() {
        let now = Utc::now();
        let token = encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({
                "email": "a@x.com",
                "iat": now.timestamp(),
                "exp": (now + Duration::minutes(5)).timestamp(),
            }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        let header = format!("Bearer {token}");
        let err = refresh(&codec(), policy(), Some(&header), now).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Denied(DenyReason::Token(TokenError::MissingClaims))
        ));
    }
}
