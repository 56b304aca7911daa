use super::prelude::*;

#[derive(Default)]
pub struct TransactionMutations;

#[Object]
impl TransactionMutations {
    /// Record a transaction under an existing category, looked up by name
    async fn create_transaction(
        &self,
        ctx: &Context<'_>,
        name: String,
        value: f64,
        category_name: String,
        description: Option<String>,
    ) -> Result<Transaction> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger
            .create_transaction(NewTransaction {
                name,
                value,
                category_name,
                description,
            })
            .await
            .map_err(into_graphql)
    }

    async fn delete_transaction(
        &self,
        ctx: &Context<'_>,
        transaction_id: i64,
    ) -> Result<GenericSuccess> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger
            .delete_transaction(transaction_id)
            .await
            .map_err(into_graphql)
    }

    /// Move a transaction to another category
    async fn update_transaction_category(
        &self,
        ctx: &Context<'_>,
        transaction_id: i64,
        category_id: i64,
    ) -> Result<Transaction> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger
            .update_transaction_category(transaction_id, category_id)
            .await
            .map_err(into_graphql)
    }

    /// Replace the description. Pass `null` to clear it.
    async fn update_transaction_description(
        &self,
        ctx: &Context<'_>,
        transaction_id: i64,
        description: Option<String>,
    ) -> Result<Transaction> {
        let ledger = ctx.data_unchecked::<LedgerService>();
        ledger
            .update_transaction_description(transaction_id, description)
            .await
            .map_err(into_graphql)
    }
}
