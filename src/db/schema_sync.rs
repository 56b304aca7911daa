//! Automatic schema synchronization from entity definitions
//!
//! - Creates missing tables from the entity column tables
//! - Adds missing columns to existing tables
//! - Creates declared secondary indexes if absent
//! - Does NOT handle column renames or type changes

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::graphql::entities::{Category, Transaction};
use crate::graphql::orm::{ColumnDef, DatabaseSchema};

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub columns_added: Vec<(String, String)>, // (table, column)
    pub indexes_created: Vec<String>,
    pub errors: Vec<String>,
}

impl SchemaSyncResult {
    fn merge(&mut self, other: SchemaSyncResult) {
        self.tables_created.extend(other.tables_created);
        self.columns_added.extend(other.columns_added);
        self.indexes_created.extend(other.indexes_created);
        self.errors.extend(other.errors);
    }
}

async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

async fn index_exists(pool: &SqlitePool, index_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='index' AND name = ?")
            .bind(index_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

async fn get_table_columns(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(i32, String, String, i32, Option<String>, i32)> =
        sqlx::query_as(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(_, name, _, _, _, _)| name).collect())
}

/// Sync a single entity's table to the database
pub async fn sync_entity<E: DatabaseSchema>(
    pool: &SqlitePool,
) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();
    let table_name = E::TABLE_NAME;

    if !table_exists(pool, table_name).await? {
        let create_sql = E::create_table_sql();
        debug!(table = table_name, sql = %create_sql, "Creating table");

        match sqlx::query(&create_sql).execute(pool).await {
            Ok(_) => {
                info!(table = table_name, "Created table");
                result.tables_created.push(table_name.to_string());
            }
            Err(e) => {
                let msg = format!("Failed to create table {}: {}", table_name, e);
                warn!("{}", msg);
                result.errors.push(msg);
                return Ok(result);
            }
        }
    } else {
        let existing_columns = get_table_columns(pool, table_name).await?;

        for col_def in E::columns() {
            if existing_columns.iter().any(|c| c == col_def.name) {
                continue;
            }
            let alter_sql = generate_add_column_sql(table_name, col_def);
            debug!(table = table_name, sql = %alter_sql, "Adding column");

            match sqlx::query(&alter_sql).execute(pool).await {
                Ok(_) => {
                    info!(table = table_name, column = col_def.name, "Added column");
                    result
                        .columns_added
                        .push((table_name.to_string(), col_def.name.to_string()));
                }
                Err(e) => {
                    let msg = format!(
                        "Failed to add column {}.{}: {}",
                        table_name, col_def.name, e
                    );
                    warn!("{}", msg);
                    result.errors.push(msg);
                }
            }
        }
    }

    for ((index_name, _), create_sql) in E::indexes().iter().zip(E::create_index_sql()) {
        if index_exists(pool, index_name).await? {
            continue;
        }
        match sqlx::query(&create_sql).execute(pool).await {
            Ok(_) => {
                info!(table = table_name, index = *index_name, "Created index");
                result.indexes_created.push(index_name.to_string());
            }
            Err(e) => {
                let msg = format!("Failed to create index {}: {}", index_name, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    Ok(result)
}

/// Generate ALTER TABLE ADD COLUMN SQL
fn generate_add_column_sql(table_name: &str, col: &ColumnDef) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table_name, col.name, col.sql_type
    );

    // SQLite cannot add PRIMARY KEY or UNIQUE columns, nor NOT NULL ones without a default
    if col.nullable {
        if let Some(default) = col.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        return sql;
    }
    let default = col.default.unwrap_or(match col.sql_type {
        "INTEGER" => "0",
        "REAL" => "0.0",
        _ => "''",
    });
    sql.push_str(&format!(" NOT NULL DEFAULT {}", default));

    sql
}

/// Sync all entity tables to the database.
///
/// Called at startup on the read-write pool. Categories go first since
/// transactions reference them.
pub async fn sync_all_entity_schemas(pool: &SqlitePool) -> SchemaSyncResult {
    let mut total_result = SchemaSyncResult::default();

    macro_rules! sync_one {
        ($entity:ty) => {
            match sync_entity::<$entity>(pool).await {
                Ok(result) => total_result.merge(result),
                Err(e) => {
                    total_result.errors.push(format!(
                        "Error syncing {}: {}",
                        stringify!($entity),
                        e
                    ));
                }
            }
        };
    }

    sync_one!(Category);
    sync_one!(Transaction);

    total_result
}
