//! Cache entries, the state they expose to readers, and the subscriptions
//! readers hold on them.

use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};

use crate::{budget::Budget, cache::ResourceKey, transaction::Transaction};

/// An immutable point-in-time copy of one fetched collection.
///
/// Refetches replace the whole snapshot, so a snapshot a reader holds never
/// changes underneath it.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// The snapshot for [ResourceKey::Transactions].
    Transactions(Arc<Vec<Transaction>>),
    /// The snapshot for [ResourceKey::Budgets].
    Budgets(Arc<Vec<Budget>>),
}

impl Snapshot {
    /// An empty snapshot of the kind held for `key`.
    pub fn empty(key: &ResourceKey) -> Self {
        match key {
            ResourceKey::Transactions => Snapshot::Transactions(Arc::default()),
            ResourceKey::Budgets(_) => Snapshot::Budgets(Arc::default()),
        }
    }

    /// The transactions in this snapshot, empty for a budgets snapshot.
    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Snapshot::Transactions(transactions) => transactions,
            Snapshot::Budgets(_) => &[],
        }
    }

    /// The budgets in this snapshot, empty for a transactions snapshot.
    pub fn budgets(&self) -> &[Budget] {
        match self {
            Snapshot::Budgets(budgets) => budgets,
            Snapshot::Transactions(_) => &[],
        }
    }

    /// The number of records in the snapshot.
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Transactions(transactions) => transactions.len(),
            Snapshot::Budgets(budgets) => budgets.len(),
        }
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether both snapshots are the same allocation, i.e. no refetch has
    /// replaced one with the other.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        match (self, other) {
            (Snapshot::Transactions(left), Snapshot::Transactions(right)) => {
                Arc::ptr_eq(left, right)
            }
            (Snapshot::Budgets(left), Snapshot::Budgets(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

/// What a reader sees of a cache entry.
#[derive(Debug, Clone)]
pub struct EntryState {
    /// The last successfully fetched records, or empty before the first
    /// successful fetch.
    pub snapshot: Snapshot,
    /// True until the first fetch for the entry settles.
    pub is_loading: bool,
    /// True if the most recent fetch failed.
    pub is_error: bool,
    /// The message of the most recent failed fetch, if it failed.
    pub error: Option<String>,
    /// When the snapshot was last replaced by a successful fetch.
    pub last_fetched: Option<OffsetDateTime>,
    /// The number of successful fetches.
    pub fetch_count: u64,
}

impl EntryState {
    fn loading(key: &ResourceKey) -> Self {
        Self {
            snapshot: Snapshot::empty(key),
            is_loading: true,
            is_error: false,
            error: None,
            last_fetched: None,
            fetch_count: 0,
        }
    }

    pub(super) fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.is_loading = false;
        self.is_error = false;
        self.error = None;
        self.last_fetched = Some(OffsetDateTime::now_utc());
        self.fetch_count += 1;
    }

    pub(super) fn record_error(&mut self, message: String) {
        self.is_loading = false;
        self.is_error = true;
        self.error = Some(message);
    }
}

/// The shared state for one cache key.
#[derive(Debug)]
pub(super) struct CacheEntry {
    pub(super) key: ResourceKey,
    pub(super) state: watch::Sender<EntryState>,
    /// Held for the duration of a fetch so one key never has two fetches in
    /// flight.
    pub(super) fetch_gate: Mutex<()>,
    fetches_started: AtomicU64,
    subscribers: AtomicUsize,
}

impl CacheEntry {
    pub(super) fn new(key: ResourceKey) -> Self {
        let (state, _) = watch::channel(EntryState::loading(&key));

        Self {
            key,
            state,
            fetch_gate: Mutex::new(()),
            fetches_started: AtomicU64::new(0),
            subscribers: AtomicUsize::new(0),
        }
    }

    pub(super) fn fetches_started(&self) -> u64 {
        self.fetches_started.load(Ordering::Acquire)
    }

    /// Must only be called while holding `fetch_gate`.
    pub(super) fn mark_fetch_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::AcqRel);
    }

    pub(super) fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }
}

/// A reader's handle on a cache entry.
///
/// The entry stays alive at least as long as one subscription to it exists.
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    entry: Arc<CacheEntry>,
    receiver: watch::Receiver<EntryState>,
}

impl Subscription {
    pub(super) fn new(entry: Arc<CacheEntry>) -> Self {
        entry.subscribers.fetch_add(1, Ordering::AcqRel);
        let receiver = entry.state.subscribe();

        Self { entry, receiver }
    }

    /// The key this subscription is for.
    pub fn key(&self) -> ResourceKey {
        self.entry.key
    }

    /// The entry's current state.
    pub fn current(&self) -> EntryState {
        self.receiver.borrow().clone()
    }

    /// Wait until the entry changes and return its new state.
    ///
    /// Returns immediately if the entry changed since this subscription last
    /// observed it through [Subscription::changed] or [Subscription::loaded].
    pub async fn changed(&mut self) -> Option<EntryState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the first fetch for the entry has settled and return the
    /// entry's state.
    pub async fn loaded(&mut self) -> EntryState {
        if let Ok(state) = self.receiver.wait_for(|state| !state.is_loading).await {
            return state.clone();
        }

        self.current()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.entry.subscribers.fetch_sub(1, Ordering::AcqRel);
    }
}
