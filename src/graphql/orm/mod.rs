//! GraphQL ORM Layer
//!
//! Traits and a query builder shared by the entity types:
//! - Column tables for schema sync (`DatabaseSchema`)
//! - Field allow-lists for filter compilation (`DatabaseEntity::filterable_fields`)
//! - Sort inputs (`DatabaseOrderBy`)
//! - SQL query generation (parameterized via sqlx)
//! - Row decoding (`FromSqlRow`)
//! - Bulk relation loading (`RelationLoader`)
//!
//! ```rust,ignore
//! use crate::graphql::entities::Transaction;
//! use crate::graphql::orm::{EntityQuery, Predicate, SqlValue};
//!
//! let rows = EntityQuery::<Transaction>::new()
//!     .where_predicate(Predicate::eq("category_id", SqlValue::Int(3)))
//!     .fetch_all(&mut conn)
//!     .await?;
//! ```

mod builder;
mod traits;

pub use builder::*;
pub use traits::*;
