//! Coordinates writes with the resource cache.
//!
//! A write is bracketed by [MutationCoordinator::begin_mutation] and
//! [MutationCoordinator::end_mutation], which drive a busy flag readers can
//! watch. After a successful write the cache is revalidated so every
//! subscriber sees the new data.

use std::{future::Future, sync::Arc};

use tokio::sync::watch;

use crate::{
    Error,
    cache::{KeyMatcher, ResourceCache, ResourceKey},
    stores::RecordStore,
};

/// Tracks whether a write is in progress and revalidates the cache after
/// successful writes.
pub struct MutationCoordinator<S> {
    cache: ResourceCache<S>,
    busy: Arc<watch::Sender<bool>>,
}

impl<S> Clone for MutationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            busy: self.busy.clone(),
        }
    }
}

impl<S> MutationCoordinator<S> {
    /// Mark a write as in progress.
    pub fn begin_mutation(&self) {
        self.busy.send_replace(true);
    }

    /// Mark the write as finished. `success` is only used for logging.
    pub fn end_mutation(&self, success: bool) {
        tracing::debug!(success, "mutation finished");
        self.busy.send_replace(false);
    }

    /// Whether a write is currently in progress.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Watch the busy flag.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// Begin a mutation that ends when the returned guard is dropped.
    fn begin_guarded(&self) -> MutationGuard<'_, S> {
        self.begin_mutation();

        MutationGuard {
            coordinator: self,
            success: false,
        }
    }
}

impl<S: RecordStore> MutationCoordinator<S> {
    /// Create a coordinator that revalidates `cache`.
    pub fn new(cache: ResourceCache<S>) -> Self {
        let (busy, _) = watch::channel(false);

        Self {
            cache,
            busy: Arc::new(busy),
        }
    }

    /// Refetch the transactions and every month's budgets.
    ///
    /// Returns once every matching entry has settled. Fetch failures are
    /// recorded on the entries.
    pub async fn commit_and_revalidate(&self) {
        let transactions = KeyMatcher::Exact(ResourceKey::Transactions);
        let budgets = KeyMatcher::all_budgets();

        let (transaction_count, budget_count) = tokio::join!(
            self.cache.invalidate(&transactions),
            self.cache.invalidate(&budgets)
        );

        tracing::debug!(
            revalidated = transaction_count + budget_count,
            "revalidated cache after write"
        );
    }

    /// Run `write` between [MutationCoordinator::begin_mutation] and
    /// [MutationCoordinator::end_mutation], revalidating the cache only if the
    /// write succeeds.
    ///
    /// The write's error is returned unchanged and the cache is left as it
    /// was. The busy flag is cleared even if the returned future is dropped
    /// before it completes or `write` panics.
    pub async fn run<T, F>(&self, write: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let mut guard = self.begin_guarded();

        let result = write.await;
        guard.success = result.is_ok();

        match &result {
            Ok(_) => self.commit_and_revalidate().await,
            Err(error) => tracing::warn!("write failed, cache left unchanged: {error}"),
        }

        result
    }
}

/// Calls [MutationCoordinator::end_mutation] when dropped.
struct MutationGuard<'a, S> {
    coordinator: &'a MutationCoordinator<S>,
    success: bool,
}

impl<S> Drop for MutationGuard<'_, S> {
    fn drop(&mut self) {
        self.coordinator.end_mutation(self.success);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::date;
    use tokio::time::Instant;

    use crate::{
        Error,
        cache::{ResourceCache, ResourceKey},
        config::CacheConfig,
        month::MonthKey,
        stores::RecordStore,
        test_utils::FakeRecordStore,
        transaction::TransactionForm,
    };

    use super::MutationCoordinator;

    const READ_DELAY: Duration = Duration::from_millis(100);

    async fn panicking_write() -> Result<(), Error> {
        panic!("write panicked")
    }

    fn get_coordinator(
        store: &FakeRecordStore,
    ) -> (
        ResourceCache<FakeRecordStore>,
        MutationCoordinator<FakeRecordStore>,
    ) {
        let cache = ResourceCache::new(store.clone(), CacheConfig::default());
        let coordinator = MutationCoordinator::new(cache.clone());

        (cache, coordinator)
    }

    #[tokio::test]
    async fn successful_write_revalidates_every_key() {
        let store = FakeRecordStore::new();
        let (cache, coordinator) = get_coordinator(&store);
        let mut transactions = cache.subscribe_transactions();
        let mut june = cache.subscribe_budgets(MonthKey::new("2024-06").unwrap());
        let mut july = cache.subscribe_budgets(MonthKey::new("2024-07").unwrap());
        transactions.loaded().await;
        june.loaded().await;
        july.loaded().await;

        let new_transaction = TransactionForm {
            amount: 12.5,
            date: Some(date!(2024 - 06 - 15)),
            category: "Food".to_owned(),
            description: None,
        }
        .validate()
        .unwrap();
        let created = coordinator
            .run(store.create_transaction(new_transaction))
            .await
            .unwrap();

        assert_eq!(store.transaction_reads(), 2);
        assert_eq!(store.budget_reads("2024-06"), 2);
        assert_eq!(store.budget_reads("2024-07"), 2);
        assert_eq!(transactions.current().snapshot.transactions(), &[created]);
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn failed_write_does_not_revalidate() {
        let store = FakeRecordStore::new();
        let (cache, coordinator) = get_coordinator(&store);
        let mut transactions = cache.subscribe_transactions();
        let before = transactions.loaded().await;
        store.set_fail_writes(true);

        let result = coordinator.run(store.delete_transaction(1)).await;

        assert_eq!(
            result,
            Err(Error::StoreUnavailable("writes are disabled".to_owned()))
        );
        assert_eq!(store.transaction_reads(), 1);
        let after = cache.state(&ResourceKey::Transactions).unwrap();
        assert_eq!(after.fetch_count, before.fetch_count);
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn busy_while_write_in_progress() {
        let store = FakeRecordStore::new();
        let (_cache, coordinator) = get_coordinator(&store);
        let busy = coordinator.subscribe_busy();
        let observer = coordinator.clone();

        coordinator
            .run(async move {
                assert!(observer.is_busy());
                assert!(*busy.borrow());
                Ok(())
            })
            .await
            .unwrap();

        assert!(!coordinator.is_busy());
    }

    #[test]
    fn begin_and_end_toggle_busy_flag() {
        let store = FakeRecordStore::new();
        let (_cache, coordinator) = get_coordinator(&store);
        let mut busy = coordinator.subscribe_busy();

        coordinator.begin_mutation();
        assert!(*busy.borrow_and_update());

        coordinator.end_mutation(false);
        assert!(!*busy.borrow_and_update());
    }

    #[tokio::test]
    async fn revalidate_without_entries_is_a_no_op() {
        let store = FakeRecordStore::new();
        let (cache, coordinator) = get_coordinator(&store);

        coordinator.commit_and_revalidate().await;

        assert!(cache.keys().is_empty());
        assert_eq!(store.transaction_reads(), 0);
        assert_eq!(store.budget_reads("2024-06"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_write_clears_busy_flag() {
        let store = FakeRecordStore::new();
        let (_cache, coordinator) = get_coordinator(&store);

        let result = tokio::time::timeout(
            Duration::from_millis(10),
            coordinator.run(std::future::pending::<Result<(), Error>>()),
        )
        .await;

        assert!(result.is_err());
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn panicking_write_clears_busy_flag() {
        let store = FakeRecordStore::new();
        let (_cache, coordinator) = get_coordinator(&store);
        let writer = coordinator.clone();

        let handle = tokio::spawn(async move { writer.run(panicking_write()).await });

        assert!(handle.await.unwrap_err().is_panic());
        assert!(!coordinator.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn revalidation_refetches_keys_concurrently() {
        let store = FakeRecordStore::new().with_read_delay(READ_DELAY);
        let (cache, coordinator) = get_coordinator(&store);
        let mut transactions = cache.subscribe_transactions();
        let mut june = cache.subscribe_budgets(MonthKey::new("2024-06").unwrap());
        let mut july = cache.subscribe_budgets(MonthKey::new("2024-07").unwrap());
        transactions.loaded().await;
        june.loaded().await;
        july.loaded().await;

        let started = Instant::now();
        coordinator.commit_and_revalidate().await;
        let elapsed = started.elapsed();

        assert_eq!(store.transaction_reads(), 2);
        assert_eq!(store.budget_reads("2024-06"), 2);
        assert_eq!(store.budget_reads("2024-07"), 2);
        // Three sequential fetches would take three read delays.
        assert!(elapsed >= READ_DELAY);
        assert!(elapsed < READ_DELAY * 2);
    }
}
