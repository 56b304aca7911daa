//! Database connection pools and scoped transactions
//!
//! Two pools are built explicitly at startup and passed down: a read-write
//! pool for mutations and schema sync, and a read-only pool for queries.

pub mod categories;
pub mod schema_sync;
pub mod transactions;

use std::str::FromStr;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

pub use categories::CategoryRepository;
pub use schema_sync::{SchemaSyncResult, sync_all_entity_schemas};
pub use transactions::{CreateTransaction, TransactionRepository};

use crate::config::DatabaseConfig;
use crate::error::FinanceError;

/// Which pool a transaction runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Database wrapper providing connection pool access
#[derive(Clone, Debug)]
pub struct Database {
    read_write: SqlitePool,
    read_only: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from existing pools
    pub fn new(read_write: SqlitePool, read_only: SqlitePool) -> Self {
        Self {
            read_write,
            read_only,
        }
    }

    /// Open both pools described by `config`.
    ///
    /// Every connection registers `REGEXP`, which text filters rely on.
    ///
    /// In-memory URLs get a single shared connection for both routes, since
    /// every new connection would otherwise see its own empty database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid DATABASE_URL {}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .with_regexp();

        if is_in_memory(&config.url) {
            let pool = Self::single_connection_pool(options)
                .await
                .context("Failed to open in-memory database")?;
            return Ok(Self::new(pool.clone(), pool));
        }

        if let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let read_write = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options.clone())
            .await
            .context("Failed to connect to database")?;

        let read_only_options = match &config.read_only_url {
            Some(url) => SqliteConnectOptions::from_str(url)
                .with_context(|| format!("Invalid DATABASE_READ_ONLY_URL {}", url))?
                .foreign_keys(true)
                .with_regexp(),
            None => options,
        }
        .read_only(true);

        let read_only = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(read_only_options);

        tracing::info!(
            url = %config.url,
            replica = config.read_only_url.is_some(),
            max_connections = config.max_connections,
            "Database pools ready"
        );

        Ok(Self::new(read_write, read_only))
    }

    /// A private in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .with_regexp();
        let pool = Self::single_connection_pool(options).await?;
        Ok(Self::new(pool.clone(), pool))
    }

    async fn single_connection_pool(
        options: SqliteConnectOptions,
    ) -> Result<SqlitePool, sqlx::Error> {
        // The database lives exactly as long as its one connection
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    }

    pub fn read_write(&self) -> &SqlitePool {
        &self.read_write
    }

    pub fn read_only(&self) -> &SqlitePool {
        &self.read_only
    }

    /// Run `body` inside one transaction on the chosen pool.
    ///
    /// Commits when the body returns `Ok`, rolls back when it returns `Err`.
    /// If the body panics the transaction guard is dropped, which also rolls
    /// back. The connection goes back to the pool in every case.
    pub async fn transaction<T, F>(&self, access: Access, body: F) -> Result<T, FinanceError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, FinanceError>>
            + Send,
    {
        let pool = match access {
            Access::ReadOnly => &self.read_only,
            Access::ReadWrite => &self.read_write,
        };

        let mut tx = pool.begin().await?;
        match body(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(?access, error = %err, "Rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// [`transaction`](Self::transaction) on the read-only pool
    pub async fn read<T, F>(&self, body: F) -> Result<T, FinanceError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, FinanceError>>
            + Send,
    {
        self.transaction(Access::ReadOnly, body).await
    }

    /// [`transaction`](Self::transaction) on the read-write pool
    pub async fn write<T, F>(&self, body: F) -> Result<T, FinanceError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, FinanceError>>
            + Send,
    {
        self.transaction(Access::ReadWrite, body).await
    }

    /// Readiness probe against the pool queries run on
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.read_only).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.read_write.close().await;
        self.read_only.close().await;
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
