use super::prelude::*;

#[derive(Default)]
pub struct TransactionQueries;

#[Object]
impl TransactionQueries {
    /// Page through transactions.
    ///
    /// `filters` entries must all hold; when `subfilters` is given at least
    /// one of its entries must hold as well.
    async fn transactions(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 10, validator(minimum = 1))] limit: i32,
        #[graphql(default = 1, validator(minimum = 1))] offset: i32,
        filters: Option<Json<Value>>,
        subfilters: Option<Json<Value>>,
        ordering: Option<TransactionOrderingInput>,
    ) -> Result<PaginationWindow<Transaction>> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        let query = window_query(limit, offset, filters, subfilters, ordering)?;

        let relations =
            TransactionRelation::for_selection(ctx.look_ahead().field("items").field("category"));

        ledger
            .list_transactions(&query, relations)
            .await
            .map_err(into_graphql)
    }

    /// Get a transaction by ID
    async fn transaction(&self, ctx: &Context<'_>, id: i64) -> Result<Transaction> {
        let ledger = ctx.data_unchecked::<LedgerService>();

        let relations = TransactionRelation::for_selection(ctx.look_ahead().field("category"));

        ledger
            .get_transaction(id, relations)
            .await
            .map_err(into_graphql)
    }
}
