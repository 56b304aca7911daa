//! SQL Query Builder for GraphQL ORM
//!
//! Provides a type-safe query builder that works with `DatabaseEntity` types
//! and uses parameterized queries via sqlx to prevent SQL injection.
//!
//! Every fragment uses positional `?` placeholders. Clauses and their values
//! are appended in lockstep, so the N-th `?` in the rendered SQL always binds
//! the N-th collected value.

use sqlx::{Row, SqliteConnection};

use super::traits::{DatabaseEntity, DatabaseOrderBy, FromSqlRow, SqlValue};
use crate::graphql::pagination::PageRequest;

/// A boolean SQL fragment plus the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// `column = ?`
    pub fn eq(column: &str, value: SqlValue) -> Self {
        Self::new(format!("{} = ?", column), vec![value])
    }

    /// `column IN (?, ...)`. An empty list matches nothing.
    pub fn in_list(column: &str, values: Vec<SqlValue>) -> Self {
        if values.is_empty() {
            return Self::new("1 = 0", Vec::new());
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        Self::new(format!("{} IN ({})", column, placeholders), values)
    }
}

/// A query builder for database entities.
///
/// Builds parameterized SQL queries for SELECT operations with
/// filtering, sorting, and pagination support.
pub struct EntityQuery<E: DatabaseEntity> {
    _phantom: std::marker::PhantomData<E>,
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl<E: DatabaseEntity + FromSqlRow> EntityQuery<E> {
    /// Create a new query builder for the entity type.
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
            where_clauses: Vec::new(),
            values: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    /// Require a single predicate.
    pub fn where_predicate(mut self, predicate: Predicate) -> Self {
        self.where_clauses.push(format!("({})", predicate.sql));
        self.values.extend(predicate.values);
        self
    }

    /// Require every predicate (AND).
    pub fn filter(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates
            .into_iter()
            .fold(self, |query, predicate| query.where_predicate(predicate))
    }

    /// Require at least one of the predicates (OR). No predicates, no restriction.
    pub fn any_of(mut self, predicates: Vec<Predicate>) -> Self {
        if predicates.is_empty() {
            return self;
        }
        let mut parts = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            parts.push(format!("({})", predicate.sql));
            self.values.extend(predicate.values);
        }
        self.where_clauses.push(format!("({})", parts.join(" OR ")));
        self
    }

    /// Add sorting to the query.
    pub fn order_by<O: DatabaseOrderBy>(mut self, order: &O) -> Self {
        if let Some(order_sql) = order.to_sql_order() {
            self.order_by = Some(order_sql);
        }
        self
    }

    /// Apply 1-based page pagination.
    pub fn paginate(mut self, page: &PageRequest) -> Self {
        self.limit = Some(page.limit());
        self.offset = Some(page.skip());
        self
    }

    /// Set limit directly.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Build the SQL query string.
    pub fn build_sql(&self) -> String {
        let mut sql = E::select_sql();
        self.push_where(&mut sql);

        if let Some(ref order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset
            && offset > 0
        {
            // SQLite only accepts OFFSET after a LIMIT
            if self.limit.is_none() {
                sql.push_str(" LIMIT -1");
            }
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }

    /// Build a COUNT query string over the same WHERE clause.
    pub fn build_count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", E::TABLE_NAME);
        self.push_where(&mut sql);
        sql
    }

    fn push_where(&self, sql: &mut String) {
        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }
    }

    /// Values in placeholder order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Execute the query and return all matching entities.
    pub async fn fetch_all(self, conn: &mut SqliteConnection) -> Result<Vec<E>, sqlx::Error> {
        let sql = self.build_sql();
        tracing::debug!(sql = %sql, "Executing entity query");

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(&mut *conn).await?;
        rows.iter().map(E::from_row).collect()
    }

    /// Execute the query and return a single entity.
    pub async fn fetch_optional(
        self,
        conn: &mut SqliteConnection,
    ) -> Result<Option<E>, sqlx::Error> {
        let results = self.limit(1).fetch_all(conn).await?;
        Ok(results.into_iter().next())
    }

    /// Execute a COUNT query.
    pub async fn count(&self, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        let sql = self.build_count_sql();
        tracing::debug!(sql = %sql, "Executing count query");

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        let row = query.fetch_one(&mut *conn).await?;
        row.try_get(0)
    }
}

impl<E: DatabaseEntity + FromSqlRow> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graphql::entities::{
        Category, Transaction, TransactionOrderingField, TransactionOrderingInput,
    };
    use crate::graphql::orm::OrderDirection;

    #[test]
    fn empty_query_selects_everything() {
        let query = EntityQuery::<Category>::new();
        assert_eq!(
            query.build_sql(),
            "SELECT id, created_at, updated_at, name FROM categories"
        );
        assert_eq!(query.build_count_sql(), "SELECT COUNT(*) FROM categories");
    }

    #[test]
    fn and_clauses_precede_or_group_in_sql_and_values() {
        let query = EntityQuery::<Transaction>::new()
            .filter(vec![
                Predicate::new("value > ?", vec![SqlValue::Float(10.0)]),
                Predicate::eq("category_id", SqlValue::Int(3)),
            ])
            .any_of(vec![
                Predicate::new("name = ?", vec![SqlValue::String("a".into())]),
                Predicate::new("name = ?", vec![SqlValue::String("b".into())]),
            ]);

        assert_eq!(
            query.build_count_sql(),
            "SELECT COUNT(*) FROM transactions WHERE (value > ?) AND (category_id = ?) \
             AND ((name = ?) OR (name = ?))"
        );
        assert_eq!(
            query.values(),
            &[
                SqlValue::Float(10.0),
                SqlValue::Int(3),
                SqlValue::String("a".into()),
                SqlValue::String("b".into()),
            ]
        );
    }

    #[test]
    fn empty_or_group_adds_nothing() {
        let query = EntityQuery::<Category>::new().any_of(Vec::new());
        assert_eq!(query.build_count_sql(), "SELECT COUNT(*) FROM categories");
    }

    #[test]
    fn ordering_and_pagination_render_after_where() {
        let page = PageRequest::new(10, 3).unwrap();
        let ordering = TransactionOrderingInput {
            field: TransactionOrderingField::Value,
            direction: OrderDirection::Desc,
        };
        let sql = EntityQuery::<Transaction>::new()
            .where_predicate(Predicate::eq("id", SqlValue::Int(1)))
            .order_by(&ordering)
            .paginate(&page)
            .build_sql();
        assert!(sql.ends_with("WHERE (id = ?) ORDER BY value DESC LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn first_page_has_no_offset() {
        let page = PageRequest::new(5, 1).unwrap();
        let sql = EntityQuery::<Category>::new().paginate(&page).build_sql();
        assert!(sql.ends_with("LIMIT 5"));
    }

    #[test]
    fn in_list_expands_placeholders() {
        let predicate = Predicate::in_list("id", vec![SqlValue::Int(1), SqlValue::Int(2)]);
        assert_eq!(predicate.sql, "id IN (?, ?)");
        assert_eq!(Predicate::in_list("id", Vec::new()).sql, "1 = 0");
    }
}
