//! # meshauth_api
//!
//! HTTP API library for Meshauth: registration, login, forward-auth
//! verification and token refresh.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use meshauth_core::auth::jwt::TokenCodec;
use meshauth_core::auth::password::PasswordHasher;
use meshauth_core::auth::secret::{SigningSecret, resolve_signing_secret};
use meshauth_core::auth::store::UserStore;
use meshauth_core::auth::{AuthService, TokenPolicy};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::error::StartupError;
use crate::handlers::{auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Credential and token flows.
    pub auth: AuthService,
    /// API configuration.
    pub config: ApiConfig,
}

/// Startup inputs checked before any connection or migration.
#[derive(Debug)]
pub struct Preflight {
    secret: SigningSecret,
    policy: TokenPolicy,
}

impl AppState {
    /// Run the secret guard and validate token lifetimes.
    ///
    /// Pure apart from logging; callers run it before touching the database
    /// so a refused configuration leaves nothing behind.
    pub fn preflight(config: &ApiConfig) -> Result<Preflight, StartupError> {
        let secret = resolve_signing_secret(config.jwt_secret.as_deref(), config.run_mode)?;
        let policy = config.token_policy()?;
        Ok(Preflight { secret, policy })
    }

    /// Wire the auth service over `store` from a passed preflight.
    pub fn assemble(
        config: ApiConfig,
        preflight: Preflight,
        store: Arc<dyn UserStore>,
    ) -> Result<Self, StartupError> {
        let auth = AuthService::new(
            store,
            PasswordHasher::new()?,
            TokenCodec::new(&preflight.secret),
            preflight.policy,
        );
        Ok(Self { auth, config })
    }

    /// [`AppState::preflight`] then [`AppState::assemble`].
    pub fn build(config: ApiConfig, store: Arc<dyn UserStore>) -> Result<Self, StartupError> {
        let preflight = Self::preflight(&config)?;
        Self::assemble(config, preflight, store)
    }
}

/// Run embedded database migrations.
///
/// Delegates to `meshauth_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    meshauth_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::GET_AUTH_VERIFY, get(auth::verify_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
