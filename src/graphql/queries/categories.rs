use super::prelude::*;

#[derive(Default)]
pub struct CategoryQueries;

#[Object]
impl CategoryQueries {
    /// Page through categories
    async fn categories(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 10, validator(minimum = 1))] limit: i32,
        #[graphql(default = 1, validator(minimum = 1))] offset: i32,
        filters: Option<Json<Value>>,
        subfilters: Option<Json<Value>>,
        ordering: Option<CategoryOrderingInput>,
    ) -> Result<PaginationWindow<Category>> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        let query = window_query(limit, offset, filters, subfilters, ordering)?;

        let relations =
            CategoryRelation::for_selection(ctx.look_ahead().field("items").field("transactions"));

        ledger
            .list_categories(&query, relations)
            .await
            .map_err(into_graphql)
    }

    async fn category(&self, ctx: &Context<'_>, id: i64) -> Result<Category> {
        let ledger = ctx.data_unchecked::<LedgerService>();

        let relations = CategoryRelation::for_selection(ctx.look_ahead().field("transactions"));

        ledger.get_category(id, relations).await.map_err(into_graphql)
    }
}
