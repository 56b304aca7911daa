//! Category database repository

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::graphql::entities::Category;
use crate::graphql::orm::{EntityQuery, Predicate, SqlValue};

/// Category statements over a connection that is usually inside a
/// transaction opened by [`Database::transaction`](super::Database::transaction).
pub struct CategoryRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CategoryRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Get a category by ID
    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<Category>, sqlx::Error> {
        EntityQuery::<Category>::new()
            .where_predicate(Predicate::eq("id", SqlValue::Int(id)))
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Get a category by its unique name
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<Category>, sqlx::Error> {
        EntityQuery::<Category>::new()
            .where_predicate(Predicate::eq("name", SqlValue::String(name.to_string())))
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Insert a category and return its ID
    pub async fn create(&mut self, name: &str) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO categories (created_at, updated_at, name)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(name)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Delete a category. Its transactions go with it via the cascading key.
    pub async fn delete(&mut self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
