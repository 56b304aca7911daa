//! Error taxonomy shared by the storage layer, the ledger service and the
//! GraphQL resolvers.
//!
//! Domain errors are plain `thiserror` enums. They are converted into
//! `async_graphql::Error` values at the resolver boundary through
//! [`ErrorExtensions`], which attaches a machine-readable `code` so clients can
//! tell a bad request from a missing record or a storage failure.

use async_graphql::ErrorExtensions;

/// The request was well-formed GraphQL but its arguments cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The filter payload is not an object of `{field: {operator: value}}`.
    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    /// The filter names a field that is not in the entity's allow-list.
    #[error("unknown field `{field}` for {entity}")]
    UnknownField { entity: &'static str, field: String },

    /// The operator is not supported, or not supported for the field's type.
    #[error("unsupported operator `{operator}` for field `{field}`")]
    UnsupportedOperator { field: String, operator: String },

    /// The operand does not match what the field and operator expect.
    #[error("invalid value for `{field}.{operator}`: {reason}")]
    InvalidValue {
        field: String,
        operator: String,
        reason: String,
    },

    /// A pagination argument is below its lower bound.
    #[error("the {name} value must be greater than or equal to 1 (got {value})")]
    PageBound { name: &'static str, value: i64 },
}

/// Errors returned by the ledger service.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} `{key}` not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} `{key}` already exists")]
    AlreadyExists { entity: &'static str, key: String },

    /// A resolver asked for a relation the executor did not load.
    #[error("relation `{0}` was not loaded")]
    RelationNotLoaded(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl FinanceError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    /// Classification exposed to clients in the `code` error extension.
    pub fn code(&self) -> &'static str {
        match self {
            FinanceError::Validation(_) => "VALIDATION_ERROR",
            FinanceError::NotFound { .. } => "NOT_FOUND",
            FinanceError::AlreadyExists { .. } => "ALREADY_EXISTS",
            FinanceError::RelationNotLoaded(_) | FinanceError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Message safe to show to API clients. Driver errors are replaced with a
    /// generic message and logged instead.
    fn public_message(&self) -> String {
        match self {
            FinanceError::Storage(e) => {
                tracing::error!(error = %e, "Storage error surfaced to client");
                "storage error: the operation could not be completed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ErrorExtensions for FinanceError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.public_message()).extend_with(|_, ext| {
            ext.set("code", self.code());
            match self {
                FinanceError::NotFound { entity, .. } | FinanceError::AlreadyExists { entity, .. } => {
                    ext.set("entity", *entity)
                }
                FinanceError::Validation(ValidationError::UnknownField { field, .. })
                | FinanceError::Validation(ValidationError::UnsupportedOperator { field, .. })
                | FinanceError::Validation(ValidationError::InvalidValue { field, .. }) => {
                    ext.set("field", field.as_str())
                }
                _ => {}
            }
        })
    }
}

/// Shorthand for resolvers: `service.call().await.map_err(into_graphql)?`.
pub fn into_graphql(err: FinanceError) -> async_graphql::Error {
    err.extend()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_classification() {
        assert_eq!(
            FinanceError::not_found("category", "Food").code(),
            "NOT_FOUND"
        );
        assert_eq!(
            FinanceError::already_exists("category", "Food").code(),
            "ALREADY_EXISTS"
        );
        assert_eq!(
            FinanceError::from(ValidationError::PageBound {
                name: "limit",
                value: 0
            })
            .code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            FinanceError::from(sqlx::Error::RowNotFound).code(),
            "STORAGE_ERROR"
        );
    }

    #[test]
    fn messages_name_the_entity() {
        let err = FinanceError::not_found("transaction", 42);
        assert_eq!(err.to_string(), "transaction `42` not found");
    }

    #[test]
    fn storage_errors_do_not_leak_driver_text() {
        let err = FinanceError::Storage(sqlx::Error::Protocol("secret detail".into()));
        let gql = err.extend();
        assert!(!gql.message.contains("secret detail"));
        let ext = serde_json::to_value(gql.extensions.as_ref().unwrap()).unwrap();
        assert_eq!(ext["code"], "STORAGE_ERROR");
    }
}
