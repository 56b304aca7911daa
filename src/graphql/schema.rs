//! GraphQL schema definition with queries and mutations

use async_graphql::extensions::Tracing;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use super::mutations::{CategoryMutations, TransactionMutations};
use super::queries::{CategoryQueries, TransactionQueries};
use crate::services::LedgerService;

/// The GraphQL schema type
pub type FinanceSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(TransactionQueries, CategoryQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(TransactionMutations, CategoryMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(ledger: LedgerService, depth_limit: usize) -> FinanceSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(ledger)
    .extension(Tracing)
    .limit_depth(depth_limit)
    .finish()
}
