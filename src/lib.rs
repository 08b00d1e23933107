//! Budget tracking with a shared, self-refreshing view of the data.
//!
//! Transactions and monthly budgets are kept in a [RecordStore]. Readers
//! subscribe to collections through the [ResourceCache], which polls the
//! store and is revalidated after every successful write made through
//! [AppState]. The [dashboard] module turns the cached snapshots into
//! category totals, monthly totals and budget views.

#![warn(missing_docs)]

mod app_state;
pub mod budget;
pub mod cache;
pub mod category;
pub mod config;
pub mod dashboard;
mod database_id;
mod db;
mod error;
pub mod format;
pub mod logging;
pub mod month;
pub mod mutation;
pub mod stores;
pub mod timezone;
pub mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use cache::{EntryState, KeyMatcher, ResourceCache, ResourceKey, Snapshot, Subscription};
pub use category::Category;
pub use config::CacheConfig;
pub use database_id::{BudgetId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use error::{Error, FieldError, ValidationErrors};
pub use month::MonthKey;
pub use mutation::MutationCoordinator;
pub use stores::{RecordStore, SqliteRecordStore};
