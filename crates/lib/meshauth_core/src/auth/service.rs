//! Authentication service: the shared handle the flows run against.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::jwt::TokenCodec;
use super::password::PasswordHasher;
use super::store::UserStore;
use super::{AuthError, DenyReason, issuance, refresh, verification};
use crate::models::auth::{AuthSession, ForwardedIdentity, IssuedToken};

/// Default access token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Default window after expiry during which a token may be refreshed: 7 days.
pub const DEFAULT_REFRESH_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound for the access token lifetime: 1 year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Upper bound for the refresh window: 10 years.
pub const MAX_REFRESH_WINDOW_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Out-of-range lifetime configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("token TTL must be between 1 and {max} seconds, got {0}", max = MAX_TOKEN_TTL_SECS)]
    Ttl(i64),

    #[error(
        "refresh window must be between 1 and {max} seconds, got {0}",
        max = MAX_REFRESH_WINDOW_SECS
    )]
    RefreshWindow(i64),
}

/// Token lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Lifetime of every issued token.
    pub ttl: Duration,
    /// How long after the original authentication refresh is accepted.
    pub refresh_window: Duration,
}

impl TokenPolicy {
    /// Policy from whole seconds, each bounded to `1..=MAX_*`.
    pub fn from_secs(ttl_secs: i64, refresh_window_secs: i64) -> Result<Self, PolicyError> {
        let ttl = bounded(ttl_secs, MAX_TOKEN_TTL_SECS).ok_or(PolicyError::Ttl(ttl_secs))?;
        let refresh_window = bounded(refresh_window_secs, MAX_REFRESH_WINDOW_SECS)
            .ok_or(PolicyError::RefreshWindow(refresh_window_secs))?;
        Ok(Self {
            ttl,
            refresh_window,
        })
    }
}

fn bounded(secs: i64, max: i64) -> Option<Duration> {
    (1..=max)
        .contains(&secs)
        .then(|| Duration::try_seconds(secs))
        .flatten()
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            refresh_window: Duration::seconds(DEFAULT_REFRESH_WINDOW_SECS),
        }
    }
}

/// Cloneable bundle of store, hasher, codec and policy.
///
/// Everything inside is immutable after construction, so concurrent
/// requests share it without locking.
#[derive(Clone)]
pub struct AuthService {
    pub(crate) store: Arc<dyn UserStore>,
    pub(crate) hasher: PasswordHasher,
    pub(crate) codec: TokenCodec,
    pub(crate) policy: TokenPolicy,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("codec", &self.codec)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        codec: TokenCodec,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Register a new user and issue a token.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, AuthError> {
        issuance::register(self, email, password, name).await
    }

    /// Authenticate with email + password and issue a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        issuance::login(self, email, password).await
    }

    /// Forward-auth check of an `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<ForwardedIdentity, DenyReason> {
        verification::verify(&self.codec, authorization, Utc::now())
    }

    /// Forward-auth check at an explicit clock reading.
    pub fn verify_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ForwardedIdentity, DenyReason> {
        verification::verify(&self.codec, authorization, now)
    }

    /// Exchange an authentic, possibly expired, token for a fresh one.
    pub fn refresh(&self, authorization: Option<&str>) -> Result<IssuedToken, AuthError> {
        refresh::refresh(&self.codec, self.policy, authorization, Utc::now())
    }

    /// Refresh at an explicit clock reading.
    pub fn refresh_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        refresh::refresh(&self.codec, self.policy, authorization, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_within_bounds() {
        assert_eq!(
            TokenPolicy::from_secs(DEFAULT_TOKEN_TTL_SECS, DEFAULT_REFRESH_WINDOW_SECS),
            Ok(TokenPolicy::default())
        );
    }

    #[test]
    fn non_positive_lifetimes_are_rejected() {
        assert_eq!(TokenPolicy::from_secs(0, 60), Err(PolicyError::Ttl(0)));
        assert_eq!(TokenPolicy::from_secs(-60, 60), Err(PolicyError::Ttl(-60)));
        assert_eq!(
            TokenPolicy::from_secs(60, -1),
            Err(PolicyError::RefreshWindow(-1))
        );
    }

    #[test]
    fn oversized_lifetimes_are_rejected_without_panicking() {
        assert_eq!(
            TokenPolicy::from_secs(i64::MAX, 60),
            Err(PolicyError::Ttl(i64::MAX))
        );
        assert_eq!(
            TokenPolicy::from_secs(10_000_000_000_000, 60),
            Err(PolicyError::Ttl(10_000_000_000_000))
        );
        assert_eq!(
            TokenPolicy::from_secs(60, i64::MAX),
            Err(PolicyError::RefreshWindow(i64::MAX))
        );
    }

    #[test]
    fn upper_bounds_are_inclusive() {
        let policy = TokenPolicy::from_secs(MAX_TOKEN_TTL_SECS, MAX_REFRESH_WINDOW_SECS).unwrap();
        assert_eq!(policy.ttl, Duration::seconds(MAX_TOKEN_TTL_SECS));
    }
}
