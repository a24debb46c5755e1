pub mod metrics_cache;

pub use metrics_cache::{CacheEntry, MetricsCache, MetricsCacheConfig};

/// Anything holding expiring in-memory state that a periodic task should prune.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Drops expired state; returns how many items were removed.
    fn sweep(&self) -> usize;
}

impl<T: Clone + Send + Sync> Sweep for MetricsCache<T> {
    fn name(&self) -> &'static str {
        "metrics_cache"
    }

    fn sweep(&self) -> usize {
        MetricsCache::sweep(self)
    }
}

impl Sweep for crate::rate_limiter::RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    fn sweep(&self) -> usize {
        crate::rate_limiter::RateLimiter::sweep(self)
    }
}
