// File: feedback-core/src/cache/metrics_cache.rs

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::utils::time::{Clock, SystemClock};

#[derive(Debug, Clone)]
pub struct MetricsCacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for MetricsCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            max_entries: 256,
        }
    }
}

/// One cached payload plus what produced it.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub filter: String,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at >= ttl
    }
}

/// TTL cache keyed by restaurant (or restaurant + view). An entry only
/// answers a read made with the same filter that produced it.
pub struct MetricsCache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    config: MetricsCacheConfig,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> MetricsCache<T> {
    pub fn new(config: MetricsCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MetricsCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            clock,
        }
    }

    /// Returns the payload for `key` if it is fresh and was produced with
    /// `filter`; a stale or mismatching entry is evicted.
    pub fn get(&self, key: &str, filter: &str) -> Option<T> {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let stale = match self.entries.get(key) {
            None => return None,
            Some(entry) => {
                if !entry.is_expired(now, ttl) && entry.filter == filter {
                    return Some(entry.data.clone());
                }
                true
            }
        };
        if stale {
            self.evict_if_stale(key, filter, now);
        }
        None
    }

    /// Re-checks under the shard's write lock, so an entry a concurrent
    /// `set` just stored for this filter survives.
    fn evict_if_stale(&self, key: &str, filter: &str, now: DateTime<Utc>) -> bool {
        let ttl = self.config.ttl;
        let evicted = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now, ttl) || entry.filter != filter)
            .is_some();
        if evicted {
            debug!("Evicted stale metrics cache entry key={} filter={}", key, filter);
        }
        evicted
    }

    pub fn set(&self, key: &str, data: T, filter: &str) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.config.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                created_at: self.clock.now(),
                filter: filter.to_string(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Invalidates every key that starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|k, _| !k.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes expired entries regardless of reads. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().created_at)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl<T: Clone> Default for MetricsCache<T> {
    fn default() -> Self {
        Self::new(MetricsCacheConfig::default())
    }
}
