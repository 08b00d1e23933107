#![allow(missing_docs)]

//! In-memory record store and record constructors shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use time::{Date, OffsetDateTime};

use crate::{
    Error,
    budget::{Budget, BudgetUpsert},
    category::Category,
    database_id::{BudgetId, TransactionId},
    month::MonthKey,
    stores::RecordStore,
    transaction::{NewTransaction, Transaction},
};

/// Build a stored transaction without going through a store.
pub(crate) fn transaction(
    id: TransactionId,
    amount: f64,
    date: Date,
    category: Category,
) -> Transaction {
    let now = OffsetDateTime::now_utc();

    Transaction {
        id,
        amount,
        date,
        category,
        description: None,
        created_at: now,
        updated_at: now,
    }
}

/// Build a stored budget without going through a store.
pub(crate) fn budget(id: BudgetId, category: Category, month: &str, amount: f64) -> Budget {
    let now = OffsetDateTime::now_utc();

    Budget {
        id,
        category,
        amount,
        month: MonthKey::new(month).unwrap(),
        created_at: now,
        updated_at: now,
    }
}

#[derive(Debug, Default)]
struct FakeState {
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    next_id: i64,
    read_delay: Option<Duration>,
    fail_reads: bool,
    fail_writes: bool,
    transaction_reads: usize,
    budget_reads: HashMap<MonthKey, usize>,
    writes: usize,
}

impl FakeState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A record store that keeps everything in memory, counts reads, and can be
/// told to fail or to take a while to answer.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRecordStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRecordStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every read wait for `delay` before answering.
    pub(crate) fn with_read_delay(self, delay: Duration) -> Self {
        self.state().read_delay = Some(delay);
        self
    }

    pub(crate) fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub(crate) fn transaction_reads(&self) -> usize {
        self.state().transaction_reads
    }

    pub(crate) fn budget_reads(&self, month: &str) -> usize {
        let month = MonthKey::new(month).unwrap();
        self.state().budget_reads.get(&month).copied().unwrap_or(0)
    }

    pub(crate) fn writes(&self) -> usize {
        self.state().writes
    }

    /// Add a transaction directly, bypassing the write counters.
    pub(crate) fn add_transaction(&self, amount: f64, date: Date, category: Category) -> Transaction {
        let mut state = self.state();
        let stored = transaction(state.next_id(), amount, date, category);
        state.transactions.push(stored.clone());
        stored
    }

    /// Add a budget directly, bypassing the write counters.
    pub(crate) fn add_budget(&self, category: Category, month: &str, amount: f64) -> Budget {
        let mut state = self.state();
        let stored = budget(state.next_id(), category, month, amount);
        state.budgets.push(stored.clone());
        stored
    }

    pub(crate) fn stored_budgets(&self) -> Vec<Budget> {
        self.state().budgets.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    async fn wait_for_read(&self) {
        let delay = self.state().read_delay;

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_write(&self) -> Result<(), Error> {
        let mut state = self.state();
        state.writes += 1;

        if state.fail_writes {
            Err(Error::StoreUnavailable("writes are disabled".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for FakeRecordStore {
    async fn get_transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.state().transaction_reads += 1;
        self.wait_for_read().await;

        let state = self.state();
        if state.fail_reads {
            return Err(Error::StoreUnavailable("store offline".to_owned()));
        }

        let mut transactions = state.transactions.clone();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn get_budgets(&self, month: MonthKey) -> Result<Vec<Budget>, Error> {
        *self.state().budget_reads.entry(month).or_default() += 1;
        self.wait_for_read().await;

        let state = self.state();
        if state.fail_reads {
            return Err(Error::StoreUnavailable("store offline".to_owned()));
        }

        Ok(state
            .budgets
            .iter()
            .filter(|budget| budget.month == month)
            .cloned()
            .collect())
    }

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        self.check_write()?;

        let mut state = self.state();
        let mut stored = transaction(
            state.next_id(),
            new_transaction.amount(),
            new_transaction.date(),
            new_transaction.category(),
        );
        stored.description = new_transaction.description().map(ToOwned::to_owned);
        state.transactions.push(stored.clone());

        Ok(stored)
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        self.check_write()?;

        let mut state = self.state();
        let stored = state
            .transactions
            .iter_mut()
            .find(|transaction| transaction.id == id)
            .ok_or(Error::UpdateMissingTransaction)?;

        stored.amount = new_transaction.amount();
        stored.date = new_transaction.date();
        stored.category = new_transaction.category();
        stored.description = new_transaction.description().map(ToOwned::to_owned);
        stored.updated_at = OffsetDateTime::now_utc();

        Ok(stored.clone())
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), Error> {
        self.check_write()?;

        let mut state = self.state();
        let count_before = state.transactions.len();
        state.transactions.retain(|transaction| transaction.id != id);

        if state.transactions.len() == count_before {
            return Err(Error::DeleteMissingTransaction);
        }

        Ok(())
    }

    async fn upsert_budget(&self, upsert: BudgetUpsert) -> Result<Budget, Error> {
        self.check_write()?;

        let mut state = self.state();
        let existing = state.budgets.iter_mut().find(|budget| {
            budget.category == upsert.category() && budget.month == upsert.month()
        });

        if let Some(existing) = existing {
            existing.amount = upsert.amount();
            existing.updated_at = OffsetDateTime::now_utc();
            return Ok(existing.clone());
        }

        let id = state.next_id();
        let stored = budget(
            id,
            upsert.category(),
            &upsert.month().to_string(),
            upsert.amount(),
        );
        state.budgets.push(stored.clone());

        Ok(stored)
    }

    async fn delete_budget(&self, id: BudgetId) -> Result<(), Error> {
        self.check_write()?;

        let mut state = self.state();
        let count_before = state.budgets.len();
        state.budgets.retain(|budget| budget.id != id);

        if state.budgets.len() == count_before {
            return Err(Error::DeleteMissingBudget);
        }

        Ok(())
    }
}
