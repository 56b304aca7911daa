//! GraphQL entities backed by database tables
//!
//! Each entity carries its column table, filter allow-list, row decoder and
//! relation loader next to its GraphQL shape.

mod category;
mod transaction;

pub use category::{Category, CategoryOrderingField, CategoryOrderingInput, CategoryRelation};
pub use transaction::{
    Transaction, TransactionOrderingField, TransactionOrderingInput, TransactionRelation,
};

use async_graphql::SimpleObject;

/// Result of a delete mutation.
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
pub struct GenericSuccess {
    pub success: bool,
    pub message: String,
}

impl GenericSuccess {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
