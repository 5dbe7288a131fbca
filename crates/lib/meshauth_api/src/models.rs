//! API request and response models.

use meshauth_core::models::auth::{AuthSession, ForwardedIdentity, User};
use serde::{Deserialize, Serialize};

/// `POST /auth/register` body. Missing fields deserialize empty and fail
/// validation rather than the JSON extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// User as returned by register/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Register/login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: AuthUser,
}

impl From<AuthSession> for TokenResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token.token,
            user: session.user.into(),
        }
    }
}

/// Refresh response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// Verified identity in response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityBody {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl From<&ForwardedIdentity> for IdentityBody {
    fn from(identity: &ForwardedIdentity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            role: identity.role_or_default().to_string(),
        }
    }
}

/// `GET /auth/verify` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifySuccess {
    pub valid: bool,
    pub user: IdentityBody,
}

/// `GET /auth/verify` denial body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyFailure {
    pub valid: bool,
    pub error: String,
}

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_connected: bool,
}
