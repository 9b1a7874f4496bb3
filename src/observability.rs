//! Metrics hooks for repository operations.
//!
//! Implement [`CacheMetrics`] to feed repository activity into your
//! monitoring system and attach it with
//! [`BaseRepository::with_metrics`](crate::BaseRepository::with_metrics):
//!
//! ```
//! use cache_repository::observability::CacheMetrics;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct HitCounter {
//!     hits: AtomicU64,
//!     misses: AtomicU64,
//! }
//!
//! impl CacheMetrics for HitCounter {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         self.hits.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn record_miss(&self, _key: &str, _duration: Duration) {
//!         self.misses.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! Methods left unimplemented fall back to `log` records. Repositories use
//! [`NoOpMetrics`] unless told otherwise.
//!
//! | Hook | Called by |
//! |------|-----------|
//! | `record_hit` / `record_miss` | `get`, `hget` |
//! | `record_set` | `set`, `hset`, `hmset` |
//! | `record_delete` | `del`, `hdel` |
//! | `record_error` | any operation returning an error from the store or decoder |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a write.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a delete.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("⚠ Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Debug, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that only emits `log` records.
#[derive(Clone, Debug, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
