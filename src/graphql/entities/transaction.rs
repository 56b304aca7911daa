//! Transaction entity

use std::collections::HashMap;

use async_graphql::{ComplexObject, Enum, InputObject, Lookahead, SimpleObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::category::{Category, CategoryRelation};
use crate::error::{FinanceError, into_graphql};
use crate::graphql::orm::{
    ColumnDef, DatabaseEntity, DatabaseOrderBy, DatabaseSchema, EntityQuery, FieldDef, FieldKind,
    FromSqlRow, OrderDirection, Predicate, RelationLoader, SqlValue,
};

/// A single income or expense entry. Always belongs to one category.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Transaction {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub value: f64,
    pub category_id: i64,

    /// Populated by [`RelationLoader::load_relations`]
    #[graphql(skip)]
    pub category: Option<Category>,
}

#[ComplexObject]
impl Transaction {
    /// The category this transaction is filed under
    async fn category(&self) -> async_graphql::Result<Category> {
        self.category
            .clone()
            .ok_or_else(|| into_graphql(FinanceError::RelationNotLoaded("category")))
    }
}

static COLUMNS: &[ColumnDef] = &[
    ColumnDef::primary_key("id"),
    ColumnDef::timestamp("created_at"),
    ColumnDef::timestamp("updated_at"),
    ColumnDef::required("name", "TEXT"),
    ColumnDef::optional("description", "TEXT"),
    ColumnDef::required("value", "REAL"),
    ColumnDef {
        references: Some("categories(id) ON DELETE CASCADE"),
        ..ColumnDef::required("category_id", "INTEGER")
    },
];

static FIELDS: &[FieldDef] = &[
    FieldDef::new("id", FieldKind::Integer),
    FieldDef::new("created_at", FieldKind::Timestamp),
    FieldDef::new("updated_at", FieldKind::Timestamp),
    FieldDef::new("name", FieldKind::Text),
    FieldDef::new("description", FieldKind::Text).nullable(),
    FieldDef::new("value", FieldKind::Real),
    FieldDef::new("category_id", FieldKind::Integer),
];

impl DatabaseEntity for Transaction {
    const TABLE_NAME: &'static str = "transactions";
    const ENTITY_NAME: &'static str = "transaction";

    fn column_names() -> &'static [&'static str] {
        &[
            "id",
            "created_at",
            "updated_at",
            "name",
            "description",
            "value",
            "category_id",
        ]
    }

    fn filterable_fields() -> &'static [FieldDef] {
        FIELDS
    }
}

impl DatabaseSchema for Transaction {
    fn columns() -> &'static [ColumnDef] {
        COLUMNS
    }

    fn indexes() -> &'static [(&'static str, &'static str)] {
        &[("idx_transactions_category_id", "category_id")]
    }
}

impl FromSqlRow for Transaction {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            value: row.try_get("value")?,
            category_id: row.try_get("category_id")?,
            category: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRelation {
    Category,
    /// The category plus every transaction filed under it
    CategoryWithTransactions,
}

impl TransactionRelation {
    /// Relations needed to resolve a selected `category` field.
    pub fn for_selection(category: Lookahead<'_>) -> Vec<Self> {
        if category.field("transactions").exists() {
            vec![Self::CategoryWithTransactions]
        } else if category.exists() {
            vec![Self::Category]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl RelationLoader for Transaction {
    type Relation = TransactionRelation;

    async fn load_relations(
        entities: &mut [Self],
        conn: &mut SqliteConnection,
        relations: &[Self::Relation],
    ) -> Result<(), sqlx::Error> {
        let nested = relations.contains(&TransactionRelation::CategoryWithTransactions);
        if entities.is_empty() || !(nested || relations.contains(&TransactionRelation::Category)) {
            return Ok(());
        }

        let mut ids: Vec<i64> = entities.iter().map(|t| t.category_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut categories = EntityQuery::<Category>::new()
            .where_predicate(Predicate::in_list(
                "id",
                ids.into_iter().map(SqlValue::Int).collect(),
            ))
            .fetch_all(&mut *conn)
            .await?;
        if nested {
            Category::load_relations(&mut categories, conn, &[CategoryRelation::Transactions])
                .await?;
        }
        let by_id: HashMap<i64, Category> = categories.into_iter().map(|c| (c.id, c)).collect();

        for transaction in entities.iter_mut() {
            transaction.category = by_id.get(&transaction.category_id).cloned();
        }
        Ok(())
    }
}

/// Columns a transaction window may be ordered by
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransactionOrderingField {
    Id,
    CreatedAt,
    UpdatedAt,
    Name,
    Description,
    Value,
    CategoryId,
}

impl TransactionOrderingField {
    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Description => "description",
            Self::Value => "value",
            Self::CategoryId => "category_id",
        }
    }
}

#[derive(InputObject, Debug, Clone, Copy)]
pub struct TransactionOrderingInput {
    pub field: TransactionOrderingField,
    #[graphql(default)]
    pub direction: OrderDirection,
}

impl DatabaseOrderBy for TransactionOrderingInput {
    fn to_sql_order(&self) -> Option<String> {
        Some(format!("{} {}", self.field.column(), self.direction.to_sql()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_declares_cascading_foreign_key() {
        let sql = Transaction::create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS transactions ("));
        assert!(
            sql.contains("category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE")
        );
        assert!(sql.contains("description TEXT,") || sql.contains("description TEXT\n"));
        assert_eq!(
            Transaction::create_index_sql(),
            vec![
                "CREATE INDEX IF NOT EXISTS idx_transactions_category_id ON transactions (category_id)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn every_ordering_field_is_a_column() {
        for field in [
            TransactionOrderingField::Id,
            TransactionOrderingField::CreatedAt,
            TransactionOrderingField::UpdatedAt,
            TransactionOrderingField::Name,
            TransactionOrderingField::Description,
            TransactionOrderingField::Value,
            TransactionOrderingField::CategoryId,
        ] {
            assert!(Transaction::column_names().contains(&field.column()));
        }
    }

    #[test]
    fn ordering_defaults_to_ascending() {
        let ordering = TransactionOrderingInput {
            field: TransactionOrderingField::Name,
            direction: OrderDirection::default(),
        };
        assert_eq!(ordering.to_sql_order().as_deref(), Some("name ASC"));
    }
}
