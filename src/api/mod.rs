//! HTTP route definitions
//!
//! The API itself is GraphQL at /graphql; health probes sit beside it.

pub mod graphql;
pub mod health;
