//! In-memory response cache.
//!
//! One `ResponseCache` per region ("currentWeather", "forecastWeather",
//! "ipLocation"). Entries expire a fixed TTL after they were written (reads
//! do not extend them). When a region is full, expired entries are purged
//! first and then the least-recently-used entry is evicted.
//!
//! Handles are cheap to clone and share the same underlying map, so the
//! cache built in `main` is process-wide.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Capacity and expiry shared by all cache regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_entries: usize,
    pub ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    written_at: Instant,
    last_used: u64,
}

struct Region<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Monotonic use counter for LRU ordering.
    tick: u64,
}

#[derive(Clone)]
pub struct ResponseCache<V> {
    name: &'static str,
    policy: CachePolicy,
    region: Arc<Mutex<Region<V>>>,
}

impl<V> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        Self {
            name,
            policy,
            region: Arc::new(Mutex::new(Region {
                entries: HashMap::new(),
                tick: 0,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a live entry, marking it most recently used.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut region = self.region.lock().await;
        let now = Instant::now();

        let expired = match region.entries.get(key) {
            None => return None,
            Some(entry) => now.duration_since(entry.written_at) >= self.policy.ttl,
        };
        if expired {
            region.entries.remove(key);
            tracing::debug!(cache = self.name, key, "Cache entry expired");
            return None;
        }

        region.tick += 1;
        let tick = region.tick;
        let entry = region.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    /// Store a value, replacing any previous entry for the key.
    pub async fn insert(&self, key: String, value: V) {
        if self.policy.max_entries == 0 {
            return;
        }

        let mut region = self.region.lock().await;
        let now = Instant::now();

        if !region.entries.contains_key(&key) && region.entries.len() >= self.policy.max_entries {
            let ttl = self.policy.ttl;
            region
                .entries
                .retain(|_, entry| now.duration_since(entry.written_at) < ttl);

            if region.entries.len() >= self.policy.max_entries {
                let lru_key = region
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(lru_key) = lru_key {
                    region.entries.remove(&lru_key);
                    tracing::debug!(cache = self.name, key = %lru_key, "Evicted least recently used entry");
                }
            }
        }

        region.tick += 1;
        let tick = region.tick;
        region.entries.insert(
            key,
            CacheEntry {
                value,
                written_at: now,
                last_used: tick,
            },
        );
    }

    /// Number of stored entries, including ones that expired but were not
    /// yet purged.
    pub async fn len(&self) -> usize {
        self.region.lock().await.entries.len()
    }
}
