//! Contains the trait for the durable collection of transactions and budgets
//! and its SQLite implementation.

pub mod sqlite;

use std::future::Future;

pub use sqlite::SqliteRecordStore;

use crate::{
    Error,
    budget::{Budget, BudgetUpsert},
    database_id::{BudgetId, TransactionId},
    month::MonthKey,
    transaction::{NewTransaction, Transaction},
};

/// Handles the storage and retrieval of transactions and budgets.
///
/// Every operation is asynchronous. Stores are cheap to clone and shared by
/// the resource cache, which reads through them, and the write operations in
/// [AppState](crate::AppState).
pub trait RecordStore: Clone + Send + Sync + 'static {
    /// Retrieve every transaction, newest first.
    fn get_transactions(&self) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;

    /// Retrieve the budgets set for `month`.
    fn get_budgets(
        &self,
        month: MonthKey,
    ) -> impl Future<Output = Result<Vec<Budget>, Error>> + Send;

    /// Create a new transaction in the store.
    fn create_transaction(
        &self,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Replace the contents of the transaction with `id`.
    ///
    /// Implementers should return [Error::UpdateMissingTransaction] if `id`
    /// does not refer to a transaction.
    fn update_transaction(
        &self,
        id: TransactionId,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, Error>> + Send;

    /// Delete the transaction with `id`.
    ///
    /// Implementers should return [Error::DeleteMissingTransaction] if `id`
    /// does not refer to a transaction.
    fn delete_transaction(&self, id: TransactionId)
    -> impl Future<Output = Result<(), Error>> + Send;

    /// Set the budget for a (category, month) pair, replacing the amount of an
    /// existing budget for that pair.
    ///
    /// Implementers must never end up with two budgets for the same pair.
    fn upsert_budget(
        &self,
        budget: BudgetUpsert,
    ) -> impl Future<Output = Result<Budget, Error>> + Send;

    /// Delete the budget with `id`.
    ///
    /// Implementers should return [Error::DeleteMissingBudget] if `id` does
    /// not refer to a budget.
    fn delete_budget(&self, id: BudgetId) -> impl Future<Output = Result<(), Error>> + Send;
}
