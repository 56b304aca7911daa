//! Offset pagination for GraphQL list queries
//!
//! List queries take a page size (`limit`) and a 1-based page number
//! (`offset`) and return a window: one page of items plus the size of the
//! whole filtered set.

use async_graphql::{OutputType, SimpleObject};
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::db::Database;
use crate::error::{FinanceError, ValidationError};
use crate::graphql::entities::{Category, Transaction};
use crate::graphql::filters::compile_filters;
use crate::graphql::orm::{DatabaseEntity, DatabaseOrderBy, EntityQuery, FromSqlRow, RelationLoader};

/// A validated page size and 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: i64,
    offset: i64,
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64) -> Result<Self, ValidationError> {
        if limit < 1 {
            return Err(ValidationError::PageBound {
                name: "limit",
                value: limit,
            });
        }
        if offset < 1 {
            return Err(ValidationError::PageBound {
                name: "offset",
                value: offset,
            });
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Rows skipped before this page
    pub fn skip(&self) -> i64 {
        (self.offset - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 1,
        }
    }
}

/// One page of items plus the total number of matching items
#[derive(SimpleObject, Debug, Clone)]
#[graphql(concrete(name = "TransactionWindow", params(Transaction)))]
#[graphql(concrete(name = "CategoryWindow", params(Category)))]
pub struct PaginationWindow<T: OutputType> {
    pub items: Vec<T>,
    pub total_items_count: i64,
}

/// Everything a list query asks of the executor
#[derive(Debug, Clone)]
pub struct WindowQuery<O> {
    pub page: PageRequest,
    /// AND-combined `{field: {operator: value}}`
    pub filters: Option<Value>,
    /// OR-combined, same shape as `filters`
    pub subfilters: Option<Value>,
    pub ordering: Option<O>,
}

impl<O> WindowQuery<O> {
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            filters: None,
            subfilters: None,
            ordering: None,
        }
    }
}

impl<O: DatabaseOrderBy> WindowQuery<O> {
    /// Compile filters and ordering into a paginated entity query.
    fn compile<E>(&self) -> Result<EntityQuery<E>, ValidationError>
    where
        E: DatabaseEntity + FromSqlRow,
    {
        let filters = compile_filters::<E>(self.filters.as_ref())?;
        let subfilters = compile_filters::<E>(self.subfilters.as_ref())?;

        let mut query = EntityQuery::<E>::new().filter(filters).any_of(subfilters);
        if let Some(ordering) = &self.ordering {
            query = query.order_by(ordering);
        }
        Ok(query.paginate(&self.page))
    }
}

/// Run a window query on the read-only pool.
///
/// Filters are compiled before a connection is taken, so malformed input
/// never touches the database. Count, page and relations are read in one
/// transaction and agree with each other.
pub async fn fetch_window<E, O>(
    db: &Database,
    request: &WindowQuery<O>,
    relations: Vec<E::Relation>,
) -> Result<PaginationWindow<E>, FinanceError>
where
    E: DatabaseEntity + FromSqlRow + RelationLoader + OutputType,
    O: DatabaseOrderBy,
{
    let query = request.compile::<E>()?;
    tracing::debug!(
        entity = E::ENTITY_NAME,
        limit = request.page.limit(),
        offset = request.page.offset(),
        ?relations,
        "Fetching window"
    );
    db.read(move |conn| Box::pin(read_window(conn, query, relations)))
        .await
}

async fn read_window<E>(
    conn: &mut SqliteConnection,
    query: EntityQuery<E>,
    relations: Vec<E::Relation>,
) -> Result<PaginationWindow<E>, FinanceError>
where
    E: DatabaseEntity + FromSqlRow + RelationLoader + OutputType,
{
    let total_items_count = query.count(conn).await?;
    let mut items = query.fetch_all(conn).await?;
    if !relations.is_empty() {
        E::load_relations(&mut items, conn, &relations).await?;
    }
    Ok(PaginationWindow {
        items,
        total_items_count,
    })
}
