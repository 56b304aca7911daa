//! Business services shared by the GraphQL resolvers

pub mod ledger;

pub use ledger::{LedgerService, NewTransaction};
