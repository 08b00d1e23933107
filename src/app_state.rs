//! Implements the context object that ties the record store, the resource
//! cache and the mutation coordinator together.

use crate::{
    Error,
    budget::{Budget, BudgetForm},
    cache::{ResourceCache, Subscription},
    config::CacheConfig,
    database_id::{BudgetId, TransactionId},
    month::MonthKey,
    mutation::MutationCoordinator,
    stores::RecordStore,
    transaction::{Transaction, TransactionForm},
};

/// The state shared by everything that reads or writes records.
///
/// Create one at start up and hand out clones. Reads go through the
/// [cache](AppState::cache) and writes go through the methods on this struct
/// so that every successful write revalidates the cache.
pub struct AppState<S> {
    store: S,
    cache: ResourceCache<S>,
    mutations: MutationCoordinator<S>,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            mutations: self.mutations.clone(),
        }
    }
}

impl<S: RecordStore> AppState<S> {
    /// Create a new [AppState] that reads from and writes to `store`.
    pub fn new(store: S, cache_config: CacheConfig) -> Self {
        let cache = ResourceCache::new(store.clone(), cache_config);
        let mutations = MutationCoordinator::new(cache.clone());

        Self {
            store,
            cache,
            mutations,
        }
    }

    /// The resource cache.
    pub fn cache(&self) -> &ResourceCache<S> {
        &self.cache
    }

    /// The mutation coordinator.
    pub fn mutations(&self) -> &MutationCoordinator<S> {
        &self.mutations
    }

    /// Subscribe to every transaction.
    pub fn subscribe_transactions(&self) -> Subscription {
        self.cache.subscribe_transactions()
    }

    /// Subscribe to the budgets for `month`.
    pub fn subscribe_budgets(&self, month: MonthKey) -> Subscription {
        self.cache.subscribe_budgets(month)
    }

    /// Validate `form` and store it as a new transaction.
    ///
    /// # Errors
    /// Returns [Error::Validation] without touching the store if the form is
    /// invalid, otherwise whatever error the store reports.
    pub async fn create_transaction(&self, form: TransactionForm) -> Result<Transaction, Error> {
        let new_transaction = form.validate()?;

        self.mutations
            .run(self.store.create_transaction(new_transaction))
            .await
    }

    /// Validate `form` and replace the transaction with `id` with it.
    ///
    /// # Errors
    /// Returns [Error::Validation] without touching the store if the form is
    /// invalid, or [Error::UpdateMissingTransaction] if `id` does not refer to
    /// a transaction.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        form: TransactionForm,
    ) -> Result<Transaction, Error> {
        let new_transaction = form.validate()?;

        self.mutations
            .run(self.store.update_transaction(id, new_transaction))
            .await
    }

    /// Delete the transaction with `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a
    /// transaction.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.mutations.run(self.store.delete_transaction(id)).await
    }

    /// Validate `form` and set the budget for its category and month,
    /// replacing the amount of an existing budget.
    ///
    /// # Errors
    /// Returns [Error::Validation] without touching the store if the form is
    /// invalid.
    pub async fn upsert_budget(&self, form: BudgetForm) -> Result<Budget, Error> {
        let upsert = form.validate()?;

        self.mutations.run(self.store.upsert_budget(upsert)).await
    }

    /// Delete the budget with `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingBudget] if `id` does not refer to a budget.
    pub async fn delete_budget(&self, id: BudgetId) -> Result<(), Error> {
        self.mutations.run(self.store.delete_budget(id)).await
    }
}
