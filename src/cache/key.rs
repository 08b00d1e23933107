//! Cache keys and the matchers used to select keys for invalidation.

use std::fmt::Display;

use crate::month::MonthKey;

/// The text form of [ResourceKey::Transactions].
pub const TRANSACTIONS_KEY: &str = "transactions";

/// The prefix shared by the text form of every [ResourceKey::Budgets] key.
pub const BUDGETS_KEY_PREFIX: &str = "budgets:";

/// Identifies one fetched collection in the resource cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    /// Every transaction.
    Transactions,
    /// The budgets set for one month.
    Budgets(MonthKey),
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKey::Transactions => write!(f, "{TRANSACTIONS_KEY}"),
            ResourceKey::Budgets(month) => write!(f, "{BUDGETS_KEY_PREFIX}{month}"),
        }
    }
}

/// Selects the cache keys an invalidation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatcher {
    /// Exactly one key.
    Exact(ResourceKey),
    /// Every key whose text form starts with the prefix, e.g. "budgets".
    Prefix(String),
}

impl KeyMatcher {
    /// Matches every budgets key, whatever the month.
    pub fn all_budgets() -> Self {
        KeyMatcher::Prefix(BUDGETS_KEY_PREFIX.to_owned())
    }

    /// Whether `key` is selected by this matcher.
    pub fn matches(&self, key: &ResourceKey) -> bool {
        match self {
            KeyMatcher::Exact(exact) => exact == key,
            KeyMatcher::Prefix(prefix) => key.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl From<ResourceKey> for KeyMatcher {
    fn from(value: ResourceKey) -> Self {
        KeyMatcher::Exact(value)
    }
}
