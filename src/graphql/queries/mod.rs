pub mod categories;
pub mod transactions;

pub use categories::CategoryQueries;
pub use transactions::TransactionQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Json, Object, Result};
    pub(crate) use serde_json::Value;

    pub(crate) use crate::error::{FinanceError, into_graphql};
    pub(crate) use crate::graphql::entities::*;
    pub(crate) use crate::graphql::pagination::{PageRequest, PaginationWindow, WindowQuery};
    pub(crate) use crate::services::LedgerService;

    /// Assemble a window query from list arguments.
    pub(crate) fn window_query<O>(
        limit: i32,
        offset: i32,
        filters: Option<Json<Value>>,
        subfilters: Option<Json<Value>>,
        ordering: Option<O>,
    ) -> Result<WindowQuery<O>> {
        let page = PageRequest::new(limit.into(), offset.into())
            .map_err(|e| into_graphql(FinanceError::from(e)))?;
        Ok(WindowQuery {
            page,
            filters: filters.map(|Json(v)| v),
            subfilters: subfilters.map(|Json(v)| v),
            ordering,
        })
    }
}
