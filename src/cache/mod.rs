//! A shared, polling-refreshed cache of the collections read from the record
//! store.
//!
//! Each distinct [ResourceKey] has one entry, created by the first
//! [subscription](ResourceCache::subscribe) to it. An entry is refreshed:
//! - on a fixed interval while the polling task runs ([ResourceCache::spawn_polling]),
//! - immediately when an [invalidation](ResourceCache::invalidate) matches its key.
//!
//! Fetches for one key never overlap. A polling refetch is skipped while a
//! fetch for the key is in flight, and an invalidation waits for the in-flight
//! fetch and is then satisfied by any fetch that started after it was issued.
//!
//! A failed fetch keeps the previous snapshot and flags the entry as errored,
//! the next refresh retries.

mod entry;
mod key;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub use entry::{EntryState, Snapshot, Subscription};
pub use key::{BUDGETS_KEY_PREFIX, KeyMatcher, ResourceKey, TRANSACTIONS_KEY};

use tokio::{
    task::{JoinHandle, JoinSet},
    time::{Instant, MissedTickBehavior},
};

use crate::{Error, config::CacheConfig, month::MonthKey, stores::RecordStore};

use entry::CacheEntry;

/// What caused a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefetchTrigger {
    /// The first fetch for a new entry.
    Initial,
    /// A polling tick.
    Interval,
    /// An explicit invalidation.
    Invalidation,
}

struct CacheInner<S> {
    store: S,
    config: CacheConfig,
    entries: Mutex<HashMap<ResourceKey, Arc<CacheEntry>>>,
}

/// The resource cache. Cloning is cheap and every clone shares the same
/// entries.
pub struct ResourceCache<S> {
    inner: Arc<CacheInner<S>>,
}

impl<S> Clone for ResourceCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: RecordStore> ResourceCache<S> {
    /// Create an empty cache that reads from `store`.
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                config,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The store the cache reads from.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The config the cache was created with.
    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    /// Subscribe to the entry for `key`.
    ///
    /// If no entry exists yet, one is created in the loading state and its
    /// first fetch is started in the background. Subscribers to the same key
    /// share one entry.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, key: ResourceKey) -> Subscription {
        let (subscription, new_entry) = {
            let mut entries = self.lock_entries();

            match entries.get(&key) {
                Some(entry) => (Subscription::new(entry.clone()), None),
                None => {
                    let entry = Arc::new(CacheEntry::new(key));
                    entries.insert(key, entry.clone());
                    (Subscription::new(entry.clone()), Some(entry))
                }
            }
        };

        if let Some(entry) = new_entry {
            tracing::debug!(%key, "created cache entry");

            let seen = entry.fetches_started();
            let cache = self.clone();
            tokio::spawn(async move {
                cache.refetch(&entry, RefetchTrigger::Initial, seen).await;
            });
        }

        subscription
    }

    /// Subscribe to every transaction.
    pub fn subscribe_transactions(&self) -> Subscription {
        self.subscribe(ResourceKey::Transactions)
    }

    /// Subscribe to the budgets for `month`.
    pub fn subscribe_budgets(&self, month: MonthKey) -> Subscription {
        self.subscribe(ResourceKey::Budgets(month))
    }

    /// The current state of the entry for `key`, without subscribing.
    pub fn state(&self, key: &ResourceKey) -> Option<EntryState> {
        self.lock_entries()
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    /// The keys that currently have an entry, in key order.
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self.lock_entries().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Refetch every entry whose key matches `matcher`.
    ///
    /// The refetches run concurrently and this function returns once all of
    /// them have settled. Individual failures are recorded on their entries
    /// and not reported here.
    ///
    /// Returns the number of entries that matched.
    pub async fn invalidate(&self, matcher: &KeyMatcher) -> usize {
        let entries = self.matching_entries(|key| matcher.matches(key));
        tracing::debug!(?matcher, matched = entries.len(), "invalidating cache entries");

        self.refetch_all(entries, RefetchTrigger::Invalidation).await
    }

    /// Run one polling tick: drop the entries nobody subscribes to any more and
    /// refetch the rest.
    ///
    /// Returns the number of entries that were considered for a refetch.
    pub async fn refresh(&self) -> usize {
        self.evict_unsubscribed();
        let entries = self.matching_entries(|_| true);

        self.refetch_all(entries, RefetchTrigger::Interval).await
    }

    /// Start the background task that calls [ResourceCache::refresh] every
    /// refresh interval.
    ///
    /// The task stops on its own once every clone of the cache is dropped.
    pub fn spawn_polling(&self) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.inner);
        let period = self.inner.config.refresh_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(inner) = cache.upgrade() else {
                    tracing::debug!("resource cache dropped, stopping polling");
                    break;
                };

                ResourceCache { inner }.refresh().await;
            }
        })
    }

    async fn refetch_all(&self, entries: Vec<Arc<CacheEntry>>, trigger: RefetchTrigger) -> usize {
        let count = entries.len();
        let mut tasks = JoinSet::new();

        for entry in entries {
            // Read before spawning so that only fetches started after this
            // call can satisfy an invalidation.
            let seen = entry.fetches_started();
            let cache = self.clone();
            tasks.spawn(async move { cache.refetch(&entry, trigger, seen).await });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                tracing::error!("a cache refetch task failed: {error}");
            }
        }

        count
    }

    /// Fetch the records for `entry` and replace its snapshot.
    ///
    /// `seen` is the number of fetches that had started for the entry when the
    /// refetch was requested.
    async fn refetch(&self, entry: &CacheEntry, trigger: RefetchTrigger, seen: u64) {
        let _gate = match trigger {
            RefetchTrigger::Interval => match entry.fetch_gate.try_lock() {
                Ok(gate) => gate,
                Err(_) => {
                    tracing::debug!(key = %entry.key, "fetch in flight, skipping polling refetch");
                    return;
                }
            },
            RefetchTrigger::Initial | RefetchTrigger::Invalidation => {
                let gate = entry.fetch_gate.lock().await;

                if entry.fetches_started() > seen {
                    tracing::debug!(key = %entry.key, ?trigger, "coalesced with a newer fetch");
                    return;
                }

                gate
            }
        };

        entry.mark_fetch_started();

        match self.fetch(entry.key).await {
            Ok(snapshot) => {
                tracing::debug!(key = %entry.key, records = snapshot.len(), ?trigger, "refreshed cache entry");
                entry
                    .state
                    .send_modify(|state| state.replace_snapshot(snapshot));
            }
            Err(error) => {
                tracing::warn!(key = %entry.key, "could not refresh cache entry, keeping the previous snapshot: {error}");
                entry
                    .state
                    .send_modify(|state| state.record_error(error.to_string()));
            }
        }
    }

    async fn fetch(&self, key: ResourceKey) -> Result<Snapshot, Error> {
        match key {
            ResourceKey::Transactions => self
                .inner
                .store
                .get_transactions()
                .await
                .map(|transactions| Snapshot::Transactions(Arc::new(transactions))),
            ResourceKey::Budgets(month) => self
                .inner
                .store
                .get_budgets(month)
                .await
                .map(|budgets| Snapshot::Budgets(Arc::new(budgets))),
        }
    }

    fn matching_entries(&self, predicate: impl Fn(&ResourceKey) -> bool) -> Vec<Arc<CacheEntry>> {
        self.lock_entries()
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    fn evict_unsubscribed(&self) {
        self.lock_entries().retain(|key, entry| {
            let subscribed = entry.subscriber_count() > 0;

            if !subscribed {
                tracing::debug!(%key, "evicting cache entry with no subscribers");
            }

            subscribed
        });
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<ResourceKey, Arc<CacheEntry>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
