//! Ledger service: the operations behind every GraphQL field
//!
//! Reads go through the paginated executor on the read-only pool. Each
//! mutation runs in one read-write transaction and returns the hydrated
//! entity read back inside that same transaction.

use sqlx::SqliteConnection;
use tracing::info;

use crate::db::{CategoryRepository, CreateTransaction, Database, TransactionRepository};
use crate::error::FinanceError;
use crate::graphql::entities::{
    Category, CategoryOrderingInput, CategoryRelation, GenericSuccess, Transaction,
    TransactionOrderingInput, TransactionRelation,
};
use crate::graphql::orm::{DatabaseEntity, RelationLoader};
use crate::graphql::pagination::{PaginationWindow, WindowQuery, fetch_window};

/// Arguments of `createTransaction`
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub name: String,
    pub value: f64,
    pub category_name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LedgerService {
    db: Database,
}

impl LedgerService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn list_transactions(
        &self,
        query: &WindowQuery<TransactionOrderingInput>,
        relations: Vec<TransactionRelation>,
    ) -> Result<PaginationWindow<Transaction>, FinanceError> {
        fetch_window(&self.db, query, relations).await
    }

    pub async fn list_categories(
        &self,
        query: &WindowQuery<CategoryOrderingInput>,
        relations: Vec<CategoryRelation>,
    ) -> Result<PaginationWindow<Category>, FinanceError> {
        fetch_window(&self.db, query, relations).await
    }

    pub async fn get_transaction(
        &self,
        id: i64,
        relations: Vec<TransactionRelation>,
    ) -> Result<Transaction, FinanceError> {
        self.db
            .read(move |conn| {
                Box::pin(async move {
                    let transaction = TransactionRepository::new(conn).get_by_id(id).await?;
                    let transaction = transaction
                        .ok_or_else(|| FinanceError::not_found(Transaction::ENTITY_NAME, id))?;
                    with_relations(conn, transaction, &relations).await
                })
            })
            .await
    }

    pub async fn get_category(
        &self,
        id: i64,
        relations: Vec<CategoryRelation>,
    ) -> Result<Category, FinanceError> {
        self.db
            .read(move |conn| {
                Box::pin(async move {
                    let category = CategoryRepository::new(conn).get_by_id(id).await?;
                    let category = category
                        .ok_or_else(|| FinanceError::not_found(Category::ENTITY_NAME, id))?;
                    with_relations(conn, category, &relations).await
                })
            })
            .await
    }

    pub async fn create_transaction(
        &self,
        input: NewTransaction,
    ) -> Result<Transaction, FinanceError> {
        let transaction = self
            .db
            .write(move |conn| Box::pin(create_transaction(conn, input)))
            .await?;
        info!(
            transaction_id = transaction.id,
            category_id = transaction.category_id,
            "Transaction created"
        );
        Ok(transaction)
    }

    pub async fn create_category(&self, name: String) -> Result<Category, FinanceError> {
        let category = self
            .db
            .write(move |conn| Box::pin(create_category(conn, name)))
            .await?;
        info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn delete_transaction(&self, id: i64) -> Result<GenericSuccess, FinanceError> {
        self.db
            .write(move |conn| {
                Box::pin(async move {
                    let mut transactions = TransactionRepository::new(conn);
                    if transactions.get_by_id(id).await?.is_none() {
                        return Err(FinanceError::not_found(Transaction::ENTITY_NAME, id));
                    }
                    transactions.delete(id).await?;
                    Ok(())
                })
            })
            .await?;
        info!(transaction_id = id, "Transaction deleted");
        Ok(GenericSuccess::ok(format!("Transaction {} deleted.", id)))
    }

    /// Deletes the category and, through the cascading key, its transactions.
    pub async fn delete_category(&self, id: i64) -> Result<GenericSuccess, FinanceError> {
        self.db
            .write(move |conn| {
                Box::pin(async move {
                    let mut categories = CategoryRepository::new(conn);
                    if categories.get_by_id(id).await?.is_none() {
                        return Err(FinanceError::not_found(Category::ENTITY_NAME, id));
                    }
                    categories.delete(id).await?;
                    Ok(())
                })
            })
            .await?;
        info!(category_id = id, "Category deleted");
        Ok(GenericSuccess::ok(format!("Category {} deleted.", id)))
    }

    pub async fn update_transaction_category(
        &self,
        transaction_id: i64,
        category_id: i64,
    ) -> Result<Transaction, FinanceError> {
        self.db
            .write(move |conn| {
                Box::pin(async move {
                    if TransactionRepository::new(conn)
                        .get_by_id(transaction_id)
                        .await?
                        .is_none()
                    {
                        return Err(FinanceError::not_found(
                            Transaction::ENTITY_NAME,
                            transaction_id,
                        ));
                    }
                    if CategoryRepository::new(conn)
                        .get_by_id(category_id)
                        .await?
                        .is_none()
                    {
                        return Err(FinanceError::not_found(Category::ENTITY_NAME, category_id));
                    }
                    TransactionRepository::new(conn)
                        .set_category(transaction_id, category_id)
                        .await?;
                    hydrate_transaction(conn, transaction_id).await
                })
            })
            .await
    }

    /// `None` and `""` are both stored as given.
    pub async fn update_transaction_description(
        &self,
        transaction_id: i64,
        description: Option<String>,
    ) -> Result<Transaction, FinanceError> {
        self.db
            .write(move |conn| {
                Box::pin(async move {
                    let mut transactions = TransactionRepository::new(conn);
                    if transactions.get_by_id(transaction_id).await?.is_none() {
                        return Err(FinanceError::not_found(
                            Transaction::ENTITY_NAME,
                            transaction_id,
                        ));
                    }
                    transactions
                        .set_description(transaction_id, description.as_deref())
                        .await?;
                    hydrate_transaction(conn, transaction_id).await
                })
            })
            .await
    }
}

async fn create_transaction(
    conn: &mut SqliteConnection,
    input: NewTransaction,
) -> Result<Transaction, FinanceError> {
    let category = CategoryRepository::new(conn)
        .get_by_name(&input.category_name)
        .await?
        .ok_or_else(|| FinanceError::not_found(Category::ENTITY_NAME, &input.category_name))?;

    let id = TransactionRepository::new(conn)
        .create(&CreateTransaction {
            name: input.name,
            value: input.value,
            description: input.description,
            category_id: category.id,
        })
        .await?;

    hydrate_transaction(conn, id).await
}

async fn create_category(conn: &mut SqliteConnection, name: String) -> Result<Category, FinanceError> {
    let mut categories = CategoryRepository::new(conn);
    if categories.get_by_name(&name).await?.is_some() {
        return Err(FinanceError::already_exists(Category::ENTITY_NAME, name));
    }

    let id = match categories.create(&name).await {
        Ok(id) => id,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(FinanceError::already_exists(Category::ENTITY_NAME, name));
        }
        Err(e) => return Err(e.into()),
    };

    let mut category = categories.get_by_id(id).await?.ok_or_else(missing_after_write)?;
    category.transactions = Some(Vec::new());
    Ok(category)
}

/// Re-read a transaction written in this transaction, with its category and
/// the category's transactions.
async fn hydrate_transaction(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Transaction, FinanceError> {
    let transaction = TransactionRepository::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(missing_after_write)?;
    with_relations(
        conn,
        transaction,
        &[TransactionRelation::CategoryWithTransactions],
    )
    .await
}

async fn with_relations<E: RelationLoader>(
    conn: &mut SqliteConnection,
    entity: E,
    relations: &[E::Relation],
) -> Result<E, FinanceError> {
    let mut entities = [entity];
    if !relations.is_empty() {
        E::load_relations(&mut entities, conn, relations).await?;
    }
    let [entity] = entities;
    Ok(entity)
}

/// A row written moments ago in the same transaction is gone.
fn missing_after_write() -> FinanceError {
    FinanceError::Storage(sqlx::Error::RowNotFound)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::db::sync_all_entity_schemas;
    use crate::graphql::pagination::PageRequest;

    async fn service() -> LedgerService {
        let db = Database::in_memory().await.unwrap();
        let sync = sync_all_entity_schemas(db.read_write()).await;
        assert!(sync.errors.is_empty(), "{:?}", sync.errors);
        LedgerService::new(db)
    }

    fn coffee() -> NewTransaction {
        NewTransaction {
            name: "Coffee".into(),
            value: 4.50,
            category_name: "Food".into(),
            description: Some("flat white".into()),
        }
    }

    async fn transaction_count(ledger: &LedgerService) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(ledger.database().read_write())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_filter_round_trip() {
        let ledger = service().await;
        ledger.create_category("Food".into()).await.unwrap();
        let created = ledger.create_transaction(coffee()).await.unwrap();
        assert_eq!(created.category.as_ref().unwrap().name, "Food");
        assert_eq!(created.created_at, created.updated_at);

        let mut query = WindowQuery::new(PageRequest::default());
        query.filters = Some(json!({"name": {"contains": "coffee"}}));
        let window = ledger
            .list_transactions(&query, vec![TransactionRelation::Category])
            .await
            .unwrap();

        assert_eq!(window.total_items_count, 1);
        let found = &window.items[0];
        assert_eq!(found.id, created.id);
        assert_eq!(found.value, 4.50);
        assert_eq!(found.category.as_ref().map(|c| c.name.as_str()), Some("Food"));
    }

    #[tokio::test]
    async fn duplicate_category_already_exists() {
        let ledger = service().await;
        let food = ledger.create_category("Food".into()).await.unwrap();
        assert_eq!(food.transactions, Some(Vec::new()));

        let err = ledger.create_category("Food".into()).await.unwrap_err();
        assert_matches!(err, FinanceError::AlreadyExists { entity: "category", ref key } if key == "Food");
    }

    #[tokio::test]
    async fn unknown_category_leaves_no_transaction() {
        let ledger = service().await;

        let err = ledger.create_transaction(coffee()).await.unwrap_err();
        assert_matches!(err, FinanceError::NotFound { entity: "category", ref key } if key == "Food");
        assert_eq!(transaction_count(&ledger).await, 0);
    }

    #[tokio::test]
    async fn deleting_a_category_cascades() {
        let ledger = service().await;
        let food = ledger.create_category("Food".into()).await.unwrap();
        let first = ledger.create_transaction(coffee()).await.unwrap();
        let second = ledger
            .create_transaction(NewTransaction {
                name: "Bagel".into(),
                ..coffee()
            })
            .await
            .unwrap();

        let ack = ledger.delete_category(food.id).await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.message, format!("Category {} deleted.", food.id));

        for id in [first.id, second.id] {
            let err = ledger.get_transaction(id, Vec::new()).await.unwrap_err();
            assert_matches!(err, FinanceError::NotFound { entity: "transaction", .. });
        }
        assert_matches!(
            ledger.delete_category(food.id).await,
            Err(FinanceError::NotFound { entity: "category", .. })
        );
    }

    #[tokio::test]
    async fn delete_transaction_acknowledges() {
        let ledger = service().await;
        ledger.create_category("Food".into()).await.unwrap();
        let created = ledger.create_transaction(coffee()).await.unwrap();

        let ack = ledger.delete_transaction(created.id).await.unwrap();
        assert_eq!(
            ack,
            GenericSuccess::ok(format!("Transaction {} deleted.", created.id))
        );
        assert_eq!(transaction_count(&ledger).await, 0);
        assert_matches!(
            ledger.delete_transaction(created.id).await,
            Err(FinanceError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn description_can_be_cleared() {
        let ledger = service().await;
        ledger.create_category("Food".into()).await.unwrap();
        let created = ledger.create_transaction(coffee()).await.unwrap();

        let updated = ledger
            .update_transaction_description(created.id, None)
            .await
            .unwrap();
        assert_eq!(updated.description, None);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let fetched = ledger.get_transaction(created.id, Vec::new()).await.unwrap();
        assert_eq!(fetched.description, None);

        let emptied = ledger
            .update_transaction_description(created.id, Some(String::new()))
            .await
            .unwrap();
        assert_eq!(emptied.description.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn recategorising_names_the_missing_entity() {
        let ledger = service().await;
        ledger.create_category("Food".into()).await.unwrap();
        let treats = ledger.create_category("Treats".into()).await.unwrap();
        let created = ledger.create_transaction(coffee()).await.unwrap();

        assert_matches!(
            ledger.update_transaction_category(999, treats.id).await,
            Err(FinanceError::NotFound { entity: "transaction", .. })
        );
        assert_matches!(
            ledger.update_transaction_category(created.id, 999).await,
            Err(FinanceError::NotFound { entity: "category", .. })
        );

        let moved = ledger
            .update_transaction_category(created.id, treats.id)
            .await
            .unwrap();
        assert_eq!(moved.category_id, treats.id);
        assert_eq!(moved.category.map(|c| c.name).as_deref(), Some("Treats"));
    }

    #[tokio::test]
    async fn written_transactions_carry_their_category_siblings() {
        let ledger = service().await;
        ledger.create_category("Food".into()).await.unwrap();
        let first = ledger.create_transaction(coffee()).await.unwrap();
        let second = ledger
            .create_transaction(NewTransaction {
                name: "Bagel".into(),
                ..coffee()
            })
            .await
            .unwrap();

        let category = second.category.unwrap();
        let siblings: Vec<i64> = category
            .transactions
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(siblings, vec![first.id, second.id]);

        let read = ledger
            .get_transaction(first.id, vec![TransactionRelation::CategoryWithTransactions])
            .await
            .unwrap();
        let siblings = read.category.unwrap().transactions.unwrap();
        assert_eq!(siblings.len(), 2);
        assert!(siblings.iter().all(|t| t.category.is_some()));
    }

    #[tokio::test]
    async fn missing_row_after_write_rolls_back() {
        let ledger = service().await;

        let result = ledger
            .database()
            .write(|conn| {
                Box::pin(async move {
                    CategoryRepository::new(conn).create("Food").await?;
                    hydrate_transaction(conn, 404).await
                })
            })
            .await;

        assert_matches!(result, Err(FinanceError::Storage(sqlx::Error::RowNotFound)));
        let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(ledger.database().read_write())
            .await
            .unwrap();
        assert_eq!(categories, 0);
    }

    #[tokio::test]
    async fn single_reads_load_requested_relations() {
        let ledger = service().await;
        let food = ledger.create_category("Food".into()).await.unwrap();
        ledger.create_transaction(coffee()).await.unwrap();

        let category = ledger
            .get_category(food.id, vec![CategoryRelation::Transactions])
            .await
            .unwrap();
        assert_eq!(category.transactions.map(|t| t.len()), Some(1));

        let bare = ledger.get_category(food.id, Vec::new()).await.unwrap();
        assert!(bare.transactions.is_none());

        assert_matches!(
            ledger.get_category(404, Vec::new()).await,
            Err(FinanceError::NotFound { entity: "category", .. })
        );
    }
}
