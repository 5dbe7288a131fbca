//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use meshauth_core::auth::{DenyReason, TokenError};
use meshauth_core::models::auth::ForwardedIdentity;
use tracing::warn;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::ApiJson;
use crate::middleware::auth::{AuthenticatedUser, authorization_header};
use crate::models::{
    IdentityBody, LoginRequest, RefreshResponse, RegisterRequest, TokenResponse, VerifyFailure,
    VerifySuccess,
};

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let session = state
        .auth
        .register(&body.email, &body.password, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let session = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(session.into()))
}

/// `GET /auth/verify`: forward-auth oracle for the edge proxy.
///
/// On success the identity is returned in the body and as `X-User-*`
/// headers for the proxy to forward upstream.
pub async fn verify_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let verified = state
        .auth
        .verify(authorization_header(&headers))
        .and_then(|identity| {
            let proxy = proxy_headers(&identity)?;
            Ok((identity, proxy))
        });

    match verified {
        Ok((identity, proxy)) => {
            let body = Json(VerifySuccess {
                valid: true,
                user: IdentityBody::from(&identity),
            });
            (proxy, body).into_response()
        }
        Err(reason) => (
            StatusCode::UNAUTHORIZED,
            [(WWW_AUTHENTICATE, "Bearer")],
            Json(VerifyFailure {
                valid: false,
                error: reason.code().to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /auth/refresh`: exchange an authentic (possibly expired) token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<RefreshResponse>> {
    let issued = state.auth.refresh(authorization_header(&headers))?;
    Ok(Json(RefreshResponse {
        token: issued.token,
    }))
}

/// `GET /auth/me`: identity of the authenticated caller.
pub async fn me_handler(
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> Json<IdentityBody> {
    Json(IdentityBody::from(&user.0))
}

/// Project the identity onto proxy headers. A claim that cannot be carried
/// in a header value denies the token as malformed.
fn proxy_headers(identity: &ForwardedIdentity) -> Result<HeaderMap, DenyReason> {
    let mut headers = HeaderMap::new();
    for (name, value) in identity.proxy_headers() {
        let value = HeaderValue::from_str(&value).map_err(|_| {
            warn!(header = name, "claim not representable as a header value");
            DenyReason::Token(TokenError::Malformed)
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}
