//! Category entity

use std::collections::HashMap;

use async_graphql::{ComplexObject, Enum, InputObject, Lookahead, SimpleObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::transaction::Transaction;
use crate::error::{FinanceError, into_graphql};
use crate::graphql::orm::{
    ColumnDef, DatabaseEntity, DatabaseOrderBy, DatabaseSchema, EntityQuery, FieldDef, FieldKind,
    FromSqlRow, OrderDirection, Predicate, RelationLoader, SqlValue,
};

/// A named bucket of transactions. Names are unique.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct Category {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,

    #[graphql(skip)]
    pub transactions: Option<Vec<Transaction>>,
}

#[ComplexObject]
impl Category {
    async fn transactions(&self) -> async_graphql::Result<Vec<Transaction>> {
        self.transactions
            .clone()
            .ok_or_else(|| into_graphql(FinanceError::RelationNotLoaded("transactions")))
    }
}

impl Category {
    /// Copy without the loaded transactions, for back-references.
    pub fn shallow(&self) -> Self {
        Self {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            name: self.name.clone(),
            transactions: None,
        }
    }
}

static COLUMNS: &[ColumnDef] = &[
    ColumnDef::primary_key("id"),
    ColumnDef::timestamp("created_at"),
    ColumnDef::timestamp("updated_at"),
    ColumnDef {
        unique: true,
        ..ColumnDef::required("name", "TEXT")
    },
];

static FIELDS: &[FieldDef] = &[
    FieldDef::new("id", FieldKind::Integer),
    FieldDef::new("created_at", FieldKind::Timestamp),
    FieldDef::new("updated_at", FieldKind::Timestamp),
    FieldDef::new("name", FieldKind::Text),
];

impl DatabaseEntity for Category {
    const TABLE_NAME: &'static str = "categories";
    const ENTITY_NAME: &'static str = "category";

    fn column_names() -> &'static [&'static str] {
        &["id", "created_at", "updated_at", "name"]
    }

    fn filterable_fields() -> &'static [FieldDef] {
        FIELDS
    }
}

impl DatabaseSchema for Category {
    fn columns() -> &'static [ColumnDef] {
        COLUMNS
    }
}

impl FromSqlRow for Category {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            name: row.try_get("name")?,
            transactions: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRelation {
    Transactions,
}

impl CategoryRelation {
    /// Relations needed to resolve a selected `transactions` field. Each
    /// loaded transaction carries its category back, so one level covers
    /// `transactions { category { .. } }` too.
    pub fn for_selection(transactions: Lookahead<'_>) -> Vec<Self> {
        if transactions.exists() {
            vec![Self::Transactions]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl RelationLoader for Category {
    type Relation = CategoryRelation;

    async fn load_relations(
        entities: &mut [Self],
        conn: &mut SqliteConnection,
        relations: &[Self::Relation],
    ) -> Result<(), sqlx::Error> {
        if entities.is_empty() || !relations.contains(&CategoryRelation::Transactions) {
            return Ok(());
        }

        let ids = entities.iter().map(|c| SqlValue::Int(c.id)).collect();
        let transactions = EntityQuery::<Transaction>::new()
            .where_predicate(Predicate::in_list("category_id", ids))
            .order_by(&IdOrder)
            .fetch_all(conn)
            .await?;

        let mut grouped: HashMap<i64, Vec<Transaction>> = HashMap::new();
        for transaction in transactions {
            grouped
                .entry(transaction.category_id)
                .or_default()
                .push(transaction);
        }

        for category in entities.iter_mut() {
            let parent = category.shallow();
            let mut children = grouped.remove(&category.id).unwrap_or_default();
            for child in &mut children {
                child.category = Some(parent.clone());
            }
            category.transactions = Some(children);
        }
        Ok(())
    }
}

/// Stable order for loaded child rows
struct IdOrder;

impl DatabaseOrderBy for IdOrder {
    fn to_sql_order(&self) -> Option<String> {
        Some("id ASC".to_string())
    }
}

/// Columns a category window may be ordered by
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CategoryOrderingField {
    Id,
    CreatedAt,
    UpdatedAt,
    Name,
}

impl CategoryOrderingField {
    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
        }
    }
}

#[derive(InputObject, Debug, Clone, Copy)]
pub struct CategoryOrderingInput {
    pub field: CategoryOrderingField,
    #[graphql(default)]
    pub direction: OrderDirection,
}

impl DatabaseOrderBy for CategoryOrderingInput {
    fn to_sql_order(&self) -> Option<String> {
        Some(format!("{} {}", self.field.column(), self.direction.to_sql()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_unique() {
        let sql = Category::create_table_sql();
        assert!(sql.contains("name TEXT NOT NULL UNIQUE"));
        assert!(Category::create_index_sql().is_empty());
    }

    #[test]
    fn shallow_copy_drops_children() {
        let now = Utc::now();
        let category = Category {
            id: 1,
            created_at: now,
            updated_at: now,
            name: "Food".into(),
            transactions: Some(Vec::new()),
        };
        let shallow = category.shallow();
        assert_eq!(shallow.name, "Food");
        assert!(shallow.transactions.is_none());
    }

    #[test]
    fn descending_order_sql() {
        let ordering = CategoryOrderingInput {
            field: CategoryOrderingField::CreatedAt,
            direction: OrderDirection::Desc,
        };
        assert_eq!(ordering.to_sql_order().as_deref(), Some("created_at DESC"));
    }
}
