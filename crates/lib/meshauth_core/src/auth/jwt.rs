//! JWT token codec.
//!
//! HS256 over `{userId, email, role?, iat, exp, authTime}`. The codec is built once
//! from the resolved signing secret and is the only holder of key material.
//! Expiry is checked against an explicit clock reading so that decoding is
//! pure with respect to the secret and the clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::secret::SigningSecret;
use super::{AuthError, TokenError};
use crate::models::auth::{IssuedToken, JwtPayload, TokenClaims};

/// Signing algorithm. Tokens with any other `alg` are rejected as malformed.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Decode behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Accept tokens whose `exp` has passed (refresh only).
    pub ignore_expiry: bool,
}

impl DecodeOptions {
    pub const STRICT: Self = Self { ignore_expiry: false };
    pub const IGNORE_EXPIRY: Self = Self { ignore_expiry: true };
}

/// A token whose signature checked out.
///
/// Subject claims stay optional here; [`DecodedToken::claims`] enforces
/// their presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `authTime`, or `iat` for tokens that predate the claim.
    pub authenticated_at: DateTime<Utc>,
}

impl DecodedToken {
    /// Required subject claims, or `MissingClaims`. Empty strings count as
    /// missing.
    pub fn claims(&self) -> Result<TokenClaims, TokenError> {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
        match (present(&self.user_id), present(&self.email)) {
            (Some(user_id), Some(email)) => Ok(TokenClaims {
                user_id,
                email,
                role: present(&self.role),
            }),
            _ => Err(TokenError::MissingClaims),
        }
    }
}

/// Encodes and decodes signed tokens with a single injected secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        Self::from_secret(secret.expose())
    }

    /// Build a codec from raw key bytes.
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by `decode_at` against the caller's clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claims` valid for `ttl` from now.
    pub fn issue(&self, claims: &TokenClaims, ttl: Duration) -> Result<IssuedToken, AuthError> {
        self.issue_at(claims, ttl, Utc::now())
    }

    /// Sign `claims` valid for `ttl` from `now`, as a fresh authentication.
    pub fn issue_at(
        &self,
        claims: &TokenClaims,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        self.reissue_at(claims, now, ttl, now)
    }

    /// Sign `claims` valid for `ttl` from `now`, keeping the time the
    /// subject originally authenticated.
    pub fn reissue_at(
        &self,
        claims: &TokenClaims,
        authenticated_at: DateTime<Utc>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        if claims.user_id.is_empty() || claims.email.is_empty() {
            return Err(AuthError::Internal(
                "token claims require userId and email".into(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(AuthError::Internal(format!("token ttl must be positive, got {ttl}")));
        }
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("token expiry out of range: {now} + {ttl}")))?;

        let iat = now.timestamp();
        let exp = expires_at.timestamp();
        let auth_time = authenticated_at.timestamp();
        let payload = JwtPayload {
            user_id: Some(claims.user_id.clone()),
            email: Some(claims.email.clone()),
            role: claims.role.clone(),
            iat,
            exp,
            auth_time: Some(auth_time),
        };
        let token = encode(&Header::new(ALGORITHM), &payload, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;

        Ok(IssuedToken {
            token,
            claims: claims.clone(),
            issued_at: DateTime::from_timestamp(iat, 0).unwrap_or(now),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(expires_at),
            authenticated_at: DateTime::from_timestamp(auth_time, 0).unwrap_or(authenticated_at),
        })
    }

    /// Verify and decode a token against the current time.
    pub fn decode(&self, token: &str, options: DecodeOptions) -> Result<DecodedToken, TokenError> {
        self.decode_at(token, options, Utc::now())
    }

    /// Verify and decode a token against `now`.
    ///
    /// The signature is checked before anything else, so a token signed
    /// under another secret is `InvalidSignature` whatever its payload says.
    pub fn decode_at(
        &self,
        token: &str,
        options: DecodeOptions,
        now: DateTime<Utc>,
    ) -> Result<DecodedToken, TokenError> {
        let payload = decode::<JwtPayload>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        let issued_at = DateTime::from_timestamp(payload.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(payload.exp, 0).ok_or(TokenError::Malformed)?;
        let authenticated_at = match payload.auth_time {
            Some(ts) => DateTime::from_timestamp(ts, 0).ok_or(TokenError::Malformed)?,
            None => issued_at,
        };

        if !options.ignore_expiry && now.timestamp() > payload.exp {
            return Err(TokenError::Expired);
        }

        Ok(DecodedToken {
            user_id: payload.user_id,
            email: payload.email,
            role: payload.role,
            issued_at,
            expires_at,
            authenticated_at,
        })
    }
}

/// Map a jsonwebtoken failure onto the three codec failure kinds.
fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
