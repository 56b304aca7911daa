//! Core traits for the GraphQL ORM layer
//!
//! Entities implement these by hand: the column table drives schema sync, the
//! field table drives filter compilation, and row decoding and relation
//! loading are explicit per entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqliteRow;

/// Constant default for timestamp columns, in the format timestamps are bound in.
/// `ALTER TABLE ADD COLUMN` only accepts constant defaults.
const EPOCH: &str = "'1970-01-01T00:00:00+00:00'";

/// Column definition for schema generation.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name in the database
    pub name: &'static str,
    /// SQLite column type (TEXT, INTEGER, REAL)
    pub sql_type: &'static str,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Whether this is the primary key
    pub is_primary_key: bool,
    /// Whether values must be unique across the table
    pub unique: bool,
    /// Default value expression
    pub default: Option<&'static str>,
    /// Foreign key target and actions (e.g. "categories(id) ON DELETE CASCADE")
    pub references: Option<&'static str>,
}

impl ColumnDef {
    /// A NOT NULL column with no constraints.
    pub const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            is_primary_key: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    /// A nullable column with no constraints.
    pub const fn optional(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, sql_type)
        }
    }

    /// A NOT NULL UTC timestamp. Rows that predate the column read as the epoch.
    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            default: Some(EPOCH),
            ..Self::required(name, "TEXT")
        }
    }

    /// An auto-incrementing integer primary key.
    pub const fn primary_key(name: &'static str) -> Self {
        Self {
            is_primary_key: true,
            ..Self::required(name, "INTEGER")
        }
    }

    /// Generate the column definition SQL
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.sql_type == "INTEGER" {
                sql.push_str(" AUTOINCREMENT");
            }
        }

        if !self.nullable && !self.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if self.unique {
            sql.push_str(" UNIQUE");
        }

        if let Some(default) = self.default {
            sql.push_str(&format!(" DEFAULT {}", default));
        }

        if let Some(target) = self.references {
            sql.push_str(&format!(" REFERENCES {}", target));
        }

        sql
    }
}

/// Trait for database schema generation and migration.
pub trait DatabaseSchema: DatabaseEntity {
    /// Get all column definitions for this entity's table
    fn columns() -> &'static [ColumnDef];

    /// Secondary indexes as `(index_name, column)` pairs.
    fn indexes() -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Generate CREATE TABLE IF NOT EXISTS SQL
    fn create_table_sql() -> String {
        let column_defs: Vec<String> = Self::columns().iter().map(|c| c.to_sql()).collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            Self::TABLE_NAME,
            column_defs.join(",\n  ")
        )
    }

    /// Generate CREATE INDEX IF NOT EXISTS statements
    fn create_index_sql() -> Vec<String> {
        Self::indexes()
            .iter()
            .map(|(name, column)| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    name,
                    Self::TABLE_NAME,
                    column
                )
            })
            .collect()
    }
}

/// How a filterable field's operands are typed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    /// RFC 3339 strings on the wire, UTC timestamps in storage
    Timestamp,
}

/// One entry of an entity's filter allow-list.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// snake_case name accepted in filters
    pub name: &'static str,
    /// Backing column
    pub column: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }
}

/// Metadata about a database entity (table).
pub trait DatabaseEntity: Sized + Send + Sync + Unpin + 'static {
    /// The SQL table name (e.g., "transactions")
    const TABLE_NAME: &'static str;

    /// Singular name used in error messages (e.g., "transaction")
    const ENTITY_NAME: &'static str;

    /// List of all column names in the table
    fn column_names() -> &'static [&'static str];

    /// Fields that filters may reference
    fn filterable_fields() -> &'static [FieldDef];

    /// Look up a filterable field by its snake_case name
    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::filterable_fields().iter().find(|f| f.name == name)
    }

    /// Build a SELECT query for all columns
    fn select_sql() -> String {
        let columns = Self::column_names().join(", ");
        format!("SELECT {} FROM {}", columns, Self::TABLE_NAME)
    }
}

/// Trait for applying sort order to a SQL query.
///
/// Implemented by the per-entity ordering inputs.
pub trait DatabaseOrderBy: Send + Sync {
    /// Get the ORDER BY clause fragment (e.g., "name ASC")
    fn to_sql_order(&self) -> Option<String>;
}

/// Trait for decoding a database row into an entity.
pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Bulk relation loading, one query per relation for the whole page.
#[async_trait]
pub trait RelationLoader: Sized + Send {
    /// The relations this entity can eagerly load
    type Relation: Copy + Send + Sync + std::fmt::Debug + 'static;

    async fn load_relations(
        entities: &mut [Self],
        conn: &mut SqliteConnection,
        relations: &[Self::Relation],
    ) -> Result<(), sqlx::Error>;
}

/// Sort direction for ORDER BY clauses.
#[derive(async_graphql::Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[graphql(name = "OrderingDirection")]
pub enum OrderDirection {
    /// Ascending order (A-Z, 1-9, oldest-newest)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest-oldest)
    Desc,
}

impl OrderDirection {
    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Represents a SQL value that can be bound to a query.
///
/// Used by filters to collect values for parameterized queries.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Bind this value to the next positional parameter
    pub fn bind_to_query<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        }
    }
}
