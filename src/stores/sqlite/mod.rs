//! Implements a SQLite backed record store.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    budget::{self, Budget, BudgetUpsert},
    database_id::{BudgetId, TransactionId},
    db::initialize,
    month::MonthKey,
    stores::RecordStore,
    transaction::{self, NewTransaction, Transaction},
};

/// Stores transactions and budgets in a SQLite database.
///
/// Queries run on Tokio's blocking thread pool so that callers on the async
/// runtime are never blocked by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Create a new record store with a SQLite database.
    ///
    /// This function will modify the database by adding the tables for the
    /// domain models if they do not already exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Run `query` against the database on the blocking thread pool.
    async fn with_connection<T, F>(&self, query: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
    {
        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|_| Error::DatabaseLockError)?;
            query(&connection)
        })
        .await
        .map_err(|error| Error::StoreUnavailable(error.to_string()))?
    }
}

impl RecordStore for SqliteRecordStore {
    async fn get_transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.with_connection(transaction::get_all_transactions).await
    }

    async fn get_budgets(&self, month: MonthKey) -> Result<Vec<Budget>, Error> {
        self.with_connection(move |connection| budget::get_budgets_for_month(month, connection))
            .await
    }

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        self.with_connection(move |connection| {
            transaction::create_transaction(&new_transaction, connection)
        })
        .await
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        self.with_connection(move |connection| {
            transaction::update_transaction(id, &new_transaction, connection)
        })
        .await
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.with_connection(move |connection| transaction::delete_transaction(id, connection))
            .await
    }

    async fn upsert_budget(&self, upsert: BudgetUpsert) -> Result<Budget, Error> {
        self.with_connection(move |connection| budget::upsert_budget(&upsert, connection))
            .await
    }

    async fn delete_budget(&self, id: BudgetId) -> Result<(), Error> {
        self.with_connection(move |connection| budget::delete_budget(id, connection))
            .await
    }
}
