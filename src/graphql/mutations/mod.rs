pub mod categories;
pub mod transactions;

pub use categories::CategoryMutations;
pub use transactions::TransactionMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::error::into_graphql;
    pub(crate) use crate::graphql::entities::*;
    pub(crate) use crate::services::{LedgerService, NewTransaction};
}
