//! Squaring with an artificial delay, with and without memoization.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::compute::lru::LruCache;
use crate::config::ComputeConfig;
use crate::observability::metrics;

/// Default memo table size.
pub const DEFAULT_CAPACITY: usize = 256;

/// Default artificial delay per computation.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(800);

/// Shared compute engine backing the `/slow` endpoint.
///
/// The memo table is locked only for lookups and inserts, never across the
/// artificial delay, so a slow miss does not stall other requests.
/// Concurrent misses for the same key both pay the delay; the last insert
/// wins.
pub struct MemoCompute {
    table: Mutex<LruCache<i64, i64>>,
    delay: Duration,
}

impl MemoCompute {
    pub fn new(capacity: NonZeroUsize, delay: Duration) -> Self {
        Self {
            table: Mutex::new(LruCache::new(capacity)),
            delay,
        }
    }

    /// Build from configuration. A zero capacity falls back to the default.
    pub fn from_config(config: &ComputeConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity, Duration::from_millis(config.delay_ms))
    }

    /// Always waits the full delay, then returns `x * x`.
    ///
    /// Callers must keep `x` small enough for the square to fit in an `i64`.
    pub async fn compute_uncached(&self, x: i64) -> i64 {
        tokio::time::sleep(self.delay).await;
        x * x
    }

    /// Returns a memoized `x * x`, paying the delay only on a miss.
    pub async fn compute_cached(&self, x: i64) -> i64 {
        if let Some(result) = self.lookup(x) {
            tracing::debug!(x, "memo hit");
            metrics::record_cache_lookup(true);
            return result;
        }

        metrics::record_cache_lookup(false);
        let result = self.compute_uncached(x).await;

        let len = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((evicted, _)) = table.put(x, result) {
                tracing::debug!(x, evicted, "memo table full, evicted least recently used");
            }
            table.len()
        };
        metrics::record_cache_size(len);

        result
    }

    /// Number of memoized results currently held.
    pub fn cached_entries(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether `x` is memoized. Does not affect recency.
    pub fn is_cached(&self, x: i64) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&x)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn lookup(&self, x: i64) -> Option<i64> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&x)
            .copied()
    }
}

impl Default for MemoCompute {
    fn default() -> Self {
        Self::from_config(&ComputeConfig::default())
    }
}
