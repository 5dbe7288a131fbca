//! Authentication and authorization logic.
//!
//! Secret resolution, password hashing, token codec, the user store seam,
//! and the issuance / verification / refresh flows built on top of them.

pub mod issuance;
pub mod jwt;
pub mod password;
pub mod queries;
pub mod refresh;
pub mod secret;
pub mod service;
pub mod store;
pub mod verification;

use thiserror::Error;

pub use service::{AuthService, PolicyError, TokenPolicy};

/// Token decode failures. Kept distinct so operators can tell causes apart
/// in logs; callers decide how much of the distinction to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Expired")]
    Expired,

    #[error("InvalidSignature")]
    InvalidSignature,

    #[error("Malformed")]
    Malformed,

    #[error("MissingClaims")]
    MissingClaims,
}

/// Why a bearer was refused by verification or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("MissingOrMalformedHeader")]
    MissingOrMalformedHeader,

    #[error("RefreshWindowElapsed")]
    RefreshWindowElapsed,

    #[error("{0}")]
    Token(#[from] TokenError),
}

impl DenyReason {
    /// Externally visible verification error code. Signature and structure
    /// failures collapse into `InvalidToken`.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::MissingOrMalformedHeader => "MissingOrMalformedHeader",
            DenyReason::Token(TokenError::Expired) => "Expired",
            DenyReason::Token(TokenError::MissingClaims) => "MissingClaims",
            DenyReason::Token(TokenError::InvalidSignature | TokenError::Malformed)
            | DenyReason::RefreshWindowElapsed => "InvalidToken",
        }
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Denied: {0}")]
    Denied(#[from] DenyReason),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::Denied(DenyReason::Token(e))
    }
}
