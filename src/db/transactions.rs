//! Transaction database repository

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::graphql::entities::Transaction;
use crate::graphql::orm::{EntityQuery, Predicate, SqlValue};

/// Input for creating a transaction
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub name: String,
    pub value: f64,
    pub description: Option<String>,
    pub category_id: i64,
}

pub struct TransactionRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TransactionRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Get a transaction by ID
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
        EntityQuery::<Transaction>::new()
            .where_predicate(Predicate::eq("id", SqlValue::Int(id)))
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Insert a transaction and return its ID
    pub async fn create(&mut self, input: &CreateTransaction) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (created_at, updated_at, name, description, value, category_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(input.name.as_str())
        .bind(input.description.as_deref())
        .bind(input.value)
        .bind(input.category_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Move a transaction to another category
    pub async fn set_category(&mut self, id: i64, category_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions SET category_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(category_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the description; `None` clears it
    pub async fn set_description(
        &mut self,
        id: i64,
        description: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions SET description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&mut self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
