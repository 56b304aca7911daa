use super::prelude::*;

#[derive(Default)]
pub struct CategoryMutations;

#[Object]
impl CategoryMutations {
    /// Create a category. Names are unique.
    async fn create_category(&self, ctx: &Context<'_>, name: String) -> Result<Category> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger.create_category(name).await.map_err(into_graphql)
    }

    /// Delete a category together with all of its transactions
    async fn delete_category(&self, ctx: &Context<'_>, category_id: i64) -> Result<GenericSuccess> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger
            .delete_category(category_id)
            .await
            .map_err(into_graphql)
    }
}
