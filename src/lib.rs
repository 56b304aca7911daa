//! Finance backend: a GraphQL API over transactions and categories.
//!
//! Library half of the crate; `main.rs` wires configuration, logging and the
//! HTTP server around it.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
pub use config::Config;
pub use db::Database;
pub use error::{FinanceError, ValidationError};
