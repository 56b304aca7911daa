//! GraphQL API over transactions and categories
//!
//! `queries/` and `mutations/` hold one `#[Object]` struct per entity; they
//! are combined with `MergedObject` in `schema.rs`.

pub mod entities;
pub mod filters;
pub mod mutations;
pub mod orm;
pub mod pagination;
pub mod queries;
mod schema;

pub use schema::{FinanceSchema, MutationRoot, QueryRoot, build_schema};
