//! Meshauth credential server binary.
//!
//! Serves registration, login, forward-auth verification and refresh for
//! the services behind the edge proxy.

use std::sync::Arc;

use clap::Parser;
use meshauth_core::auth::queries::PgUserStore;
use meshauth_core::auth::secret::{RunMode, configured_secret_from_env};
use meshauth_core::auth::service::{
    DEFAULT_REFRESH_WINDOW_SECS, DEFAULT_TOKEN_TTL_SECS, MAX_REFRESH_WINDOW_SECS,
    MAX_TOKEN_TTL_SECS,
};
use meshauth_core::auth::store::{MemoryUserStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

/// CLI arguments for the credential server.
#[derive(Parser, Debug)]
#[command(name = "meshauth_server", about = "Meshauth credential server")]
struct Args {
    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 3100)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/meshauth"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// HMAC signing secret. Falls back to `AUTH_SECRET` when unset.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token lifetime in seconds.
    #[arg(
        long,
        env = "TOKEN_TTL_SECS",
        default_value_t = DEFAULT_TOKEN_TTL_SECS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_SECS)
    )]
    token_ttl_secs: i64,

    /// Seconds after login during which a token may still be refreshed.
    #[arg(
        long,
        env = "REFRESH_WINDOW_SECS",
        default_value_t = DEFAULT_REFRESH_WINDOW_SECS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_REFRESH_WINDOW_SECS)
    )]
    refresh_window_secs: i64,

    /// Deployment mode (`development` or `production`).
    #[arg(long = "env", env = "APP_ENV", default_value = "development")]
    run_mode: RunMode,

    /// Keep users in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,meshauth_api=debug,meshauth_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    info!(
        port = args.port,
        run_mode = %args.run_mode,
        memory_store = args.memory_store,
        "starting meshauth_server"
    );

    let config = meshauth_api::config::ApiConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        pg_connection_url: args.database_url,
        jwt_secret: args.jwt_secret.or_else(configured_secret_from_env),
        run_mode: args.run_mode,
        token_ttl_secs: args.token_ttl_secs,
        refresh_window_secs: args.refresh_window_secs,
    };

    // Refuse to start before connecting when the secret or lifetimes are unusable.
    let preflight = meshauth_api::AppState::preflight(&config).inspect_err(|e| {
        error!(error = %e, "refusing to start");
    })?;

    let store: Arc<dyn UserStore> = if args.memory_store {
        if config.run_mode == RunMode::Production {
            warn!("in-memory user store selected in production; users are lost on restart");
        }
        Arc::new(MemoryUserStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        meshauth_api::migrate(&pool).await?;
        Arc::new(PgUserStore::new(pool))
    };

    let state = meshauth_api::AppState::assemble(config.clone(), preflight, store)?;

    let app = meshauth_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("meshauth_server").chain(extra.iter().copied()))
    }

    #[test]
    fn lifetimes_outside_range_are_rejected() {
        assert!(parse(&["--token-ttl-secs", "0"]).is_err());
        assert!(parse(&["--token-ttl-secs=-60"]).is_err());
        assert!(parse(&["--token-ttl-secs", "10000000000000"]).is_err());
        assert!(parse(&["--refresh-window-secs", "0"]).is_err());
    }

    #[test]
    fn lifetimes_inside_range_are_accepted() {
        let args = parse(&["--token-ttl-secs", "900", "--refresh-window-secs", "3600"]).unwrap();
        assert_eq!(args.token_ttl_secs, 900);
        assert_eq!(args.refresh_window_secs, 3600);
    }

    #[test]
    fn unknown_run_mode_is_rejected() {
        assert!(parse(&["--env", "prd"]).is_err());
    }
}
