//! Bounded TTL cache with least-recently-used eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache tuning knobs.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct TtlCacheConfig {
    /// Entry lifetime in seconds
    default_ttl_secs: u64,
    /// Maximum entry count before LRU eviction
    max_size: usize,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            max_size: 1_000,
        }
    }
}

impl TtlCacheConfig {
    /// Set the entry lifetime in seconds.
    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    /// Set the maximum entry count.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_access: Instant,
}

/// Bounded TTL cache.
///
/// Reads past an entry's TTL miss (and drop the entry). Inserting past
/// `max_size` evicts the least recently used entry first.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    config: TtlCacheConfig,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    /// Create a cache with the given configuration.
    pub fn new(config: TtlCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Insert or replace a value under `key`, with an optional TTL
    /// override in seconds.
    pub fn insert(&mut self, key: K, value: V, ttl_secs: Option<u64>) {
        let now = Instant::now();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_size {
            self.evict_lru();
        }
        let ttl = Duration::from_secs(ttl_secs.unwrap_or(self.config.default_ttl_secs));
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                last_access: now,
            },
        );
    }

    /// Fetch a live value, refreshing its recency. Expired entries are
    /// removed and miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                let entry = self.entries.get_mut(key).unwrap();
                entry.last_access = now;
                Some(&entry.value)
            }
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Drop one entry regardless of freshness.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Evicted expired cache entries");
        }
        removed
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&key);
        }
    }
}

impl<K: Eq + Hash + Clone, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(TtlCacheConfig::default())
    }
}
