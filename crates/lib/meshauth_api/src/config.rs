//! API server configuration.

use meshauth_core::auth::secret::RunMode;
use meshauth_core::auth::service::{DEFAULT_REFRESH_WINDOW_SECS, DEFAULT_TOKEN_TTL_SECS};
use meshauth_core::auth::{PolicyError, TokenPolicy};
use thiserror::Error;

/// Environment variables consulted for the signing secret, in order.
const SECRET_VARS: [&str; 2] = ["JWT_SECRET", "AUTH_SECRET"];

/// A configuration variable that is present but unusable.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Configured JWT signing secret, if any. Resolved by the secret guard.
    pub jwt_secret: Option<String>,
    /// Deployment mode; production makes a missing secret fatal.
    pub run_mode: RunMode,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Seconds after the original login during which refresh is accepted.
    pub refresh_window_secs: i64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("run_mode", &self.run_mode)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("refresh_window_secs", &self.refresh_window_secs)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                     | Default                               |
    /// |------------------------------|---------------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:3100`                      |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/meshauth`  |
    /// | `JWT_SECRET` / `AUTH_SECRET` | none (dev fallback outside production)|
    /// | `APP_ENV`                    | `development`                         |
    /// | `TOKEN_TTL_SECS`             | `86400`                               |
    /// | `REFRESH_WINDOW_SECS`        | `604800`                              |
    ///
    /// Unset variables take the default. Set but unparseable ones are an
    /// error, so a misspelt `APP_ENV` never downgrades production.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same resolution as [`ApiConfig::from_env`] over an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let run_mode = match lookup("APP_ENV") {
            Some(raw) => raw.parse::<RunMode>().map_err(|message| ConfigError {
                key: "APP_ENV",
                message,
            })?,
            None => RunMode::default(),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3100".into()),
            pg_connection_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/meshauth".into()),
            jwt_secret: SECRET_VARS
                .into_iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty()),
            run_mode,
            token_ttl_secs: secs(&lookup, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
            refresh_window_secs: secs(&lookup, "REFRESH_WINDOW_SECS", DEFAULT_REFRESH_WINDOW_SECS)?,
        })
    }

    /// Token lifetime policy derived from this configuration.
    pub fn token_policy(&self) -> Result<TokenPolicy, PolicyError> {
        TokenPolicy::from_secs(self.token_ttl_secs, self.refresh_window_secs)
    }
}

/// Integer seconds from `key`, else `default`. Range is checked by the policy.
fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: i64,
) -> Result<i64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|e| ConfigError {
            key,
            message: e.to_string(),
        }),
    }
}
