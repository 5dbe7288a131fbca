//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! models (which carry `#[serde(rename)]` for camelCase etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain user, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Subject claims bound into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
}

impl TokenClaims {
    /// Claims for a freshly registered or logged-in user (no role).
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: None,
        }
    }
}

/// Wire shape of the JWT payload.
///
/// Subject fields are optional on the way in so that a validly signed but
/// incomplete token can be told apart from a malformed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// When the subject last presented credentials (unix timestamp).
    /// Refresh carries it forward unchanged; absent means `iat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Original authentication time, bounding how long refresh is allowed.
    pub authenticated_at: DateTime<Utc>,
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

/// Verified identity projected for the edge proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedIdentity {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
}

impl ForwardedIdentity {
    /// Role reported in the response body when the token carries none.
    pub const DEFAULT_ROLE: &'static str = "user";

    /// Header name/value pairs to forward upstream. The role header is only
    /// emitted when the claim is present.
    pub fn proxy_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("x-user-id", self.user_id.clone()),
            ("x-user-email", self.email.clone()),
        ];
        if let Some(role) = &self.role {
            headers.push(("x-user-role", role.clone()));
        }
        headers
    }

    /// Role for the response body.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(Self::DEFAULT_ROLE)
    }
}

impl From<TokenClaims> for ForwardedIdentity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}
