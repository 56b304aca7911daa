//! Finance Backend - GraphQL service for transactions and categories
//!
//! All operations are exposed via GraphQL at /graphql.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finance_backend::db::sync_all_entity_schemas;
use finance_backend::{AppState, Config, Database, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finance_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Starting Finance Backend");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let db = Database::connect(&config.database).await?;
    tracing::info!("Database connected");

    let sync_result = sync_all_entity_schemas(db.read_write()).await;
    if !sync_result.tables_created.is_empty() {
        tracing::info!(tables = ?sync_result.tables_created, "Created tables");
    }
    if !sync_result.columns_added.is_empty() {
        tracing::info!(columns = ?sync_result.columns_added, "Added columns");
    }
    for err in &sync_result.errors {
        tracing::error!(error = %err, "Schema sync error");
    }
    if !sync_result.errors.is_empty() {
        anyhow::bail!("Schema sync failed with {} error(s)", sync_result.errors.len());
    }

    let state = AppState::new(&config, db.clone());
    let app = build_app(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let sigint = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = sigint => {},
        () = sigterm => {},
    }
    tracing::info!("Shutdown signal received");
}
