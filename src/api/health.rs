//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};

use crate::app::AppState;

/// Liveness: the process is up
async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Readiness: the read-only pool answers a query
async fn ready(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}
