//! Configuration for the resource cache.

use std::time::Duration;

/// How often the resource cache refetches subscribed keys by default.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Controls how the resource cache keeps its entries fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// The time between two polling refetches of every subscribed key.
    pub refresh_interval: Duration,
}

impl CacheConfig {
    /// Create a config that polls every `refresh_interval`.
    ///
    /// Intervals shorter than one millisecond are raised to one millisecond.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval: refresh_interval.max(Duration::from_millis(1)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CacheConfig, DEFAULT_REFRESH_INTERVAL};

    #[test]
    fn default_polls_every_five_seconds() {
        assert_eq!(CacheConfig::default().refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(DEFAULT_REFRESH_INTERVAL, Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_is_raised() {
        let config = CacheConfig::new(Duration::ZERO);

        assert_eq!(config.refresh_interval, Duration::from_millis(1));
    }
}
