//! Signing secret resolution.
//!
//! Runs once at process start. A missing secret is fatal in production and
//! falls back to a fixed development secret otherwise; a short secret is
//! only ever a warning.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;

/// Minimum secret length (bytes) before a weak-secret warning is emitted.
pub const MIN_SECRET_LEN: usize = 32;

/// Development-only signing secret. Never reachable in production mode.
const DEV_FALLBACK_SECRET: &str = "meshauth-dev-only-signing-secret-do-not-deploy";

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(RunMode::Production),
            "development" | "dev" | "test" => Ok(RunMode::Development),
            other => Err(format!("unknown run mode '{other}'")),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

/// Startup misconfiguration.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("JWT_SECRET must be set when running in production")]
    MissingInProduction,
}

/// The resolved signing secret. Debug output is redacted.
pub struct SigningSecret {
    value: SecretString,
    fallback: bool,
}

impl SigningSecret {
    /// Wrap an explicit secret (tests, embedding).
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            fallback: false,
        }
    }

    /// Raw key material for the token codec.
    pub fn expose(&self) -> &[u8] {
        self.value.expose_secret().as_bytes()
    }

    /// Whether this is the development fallback.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("value", &"[REDACTED]")
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Resolve the signing secret from configuration.
///
/// Empty or whitespace-only values count as absent.
pub fn resolve_signing_secret(
    configured: Option<&str>,
    mode: RunMode,
) -> Result<SigningSecret, SecretError> {
    let configured = configured.filter(|s| !s.trim().is_empty());

    let secret = match (configured, mode) {
        (Some(value), _) => SigningSecret::new(value),
        (None, RunMode::Production) => return Err(SecretError::MissingInProduction),
        (None, RunMode::Development) => {
            warn!("no JWT secret configured, using the development fallback secret");
            SigningSecret {
                value: SecretString::from(DEV_FALLBACK_SECRET),
                fallback: true,
            }
        }
    };

    if !secret.fallback && secret.expose().len() < MIN_SECRET_LEN {
        warn!(
            min_len = MIN_SECRET_LEN,
            %mode,
            "JWT secret is shorter than the recommended minimum"
        );
    }

    Ok(secret)
}

/// Read the configured secret: env var `JWT_SECRET` → `AUTH_SECRET`.
pub fn configured_secret_from_env() -> Option<String> {
    ["JWT_SECRET", "AUTH_SECRET"]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}
