//! Health endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /health`: reports the crate version and store connectivity.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match state.auth.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("store health check failed: {e}");
            false
        }
    };

    Json(HealthResponse {
        status: if store_connected { "ok" } else { "degraded" }.to_string(),
        version: meshauth_core::version().to_string(),
        store_connected,
    })
}
