//! TTL cache storage primitives.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use metrics::counter;

use super::lock::write_guard;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Keyed cache with a fixed per-entry lifetime.
///
/// Expired entries are dropped on access and count as misses. There is no
/// stampede protection: concurrent misses may each query the backend, which
/// is acceptable because all cached reads are idempotent.
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = write_guard(&self.entries, self.name);
        match entries.get(key) {
            Some(entry) if !entry.expired() => {
                counter!("lumina_cache_hit_total", "cache" => self.name).increment(1);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                counter!("lumina_cache_miss_total", "cache" => self.name).increment(1);
                None
            }
            None => {
                counter!("lumina_cache_miss_total", "cache" => self.name).increment(1);
                None
            }
        }
    }

    pub fn set(&self, key: K, value: V) {
        write_guard(&self.entries, self.name).insert(key, Entry::new(value, self.ttl));
    }

    pub fn remove(&self, key: &K) {
        write_guard(&self.entries, self.name).remove(key);
    }

    /// Replace whatever is cached under `key`, resetting its lifetime.
    pub fn update(&self, key: K, value: V) {
        self.remove(&key);
        self.set(key, value);
    }

    pub fn clear(&self) {
        write_guard(&self.entries, self.name).clear();
    }

    pub fn len(&self) -> usize {
        write_guard(&self.entries, self.name).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single-value variant of [`TtlCache`] for process-wide aggregates.
pub struct TtlSlot<V> {
    name: &'static str,
    ttl: Duration,
    entry: RwLock<Option<Entry<V>>>,
}

impl<V: Clone> TtlSlot<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<V> {
        let mut slot = write_guard(&self.entry, self.name);
        match slot.as_ref() {
            Some(entry) if !entry.expired() => {
                counter!("lumina_cache_hit_total", "cache" => self.name).increment(1);
                Some(entry.value.clone())
            }
            _ => {
                slot.take();
                counter!("lumina_cache_miss_total", "cache" => self.name).increment(1);
                None
            }
        }
    }

    pub fn set(&self, value: V) {
        *write_guard(&self.entry, self.name) = Some(Entry::new(value, self.ttl));
    }

    pub fn invalidate(&self) {
        write_guard(&self.entry, self.name).take();
    }
}
