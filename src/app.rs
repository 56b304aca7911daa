//! Application state and HTTP router construction.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::{FinanceSchema, build_schema};
use crate::services::LedgerService;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub schema: FinanceSchema,
}

impl AppState {
    /// Wire the ledger service and schema over an open database.
    pub fn new(config: &Config, db: Database) -> Self {
        let ledger = LedgerService::new(db.clone());
        let schema = build_schema(ledger, config.graphql_depth_limit);
        Self { db, schema }
    }
}

/// Build the full Axum router with state applied, ready for `axum::serve`.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(api::health::router())
        .merge(api::graphql::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
