use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Key → value cache whose entries expire a fixed time after insertion.
///
/// Callers pass the current instant so expiry does not depend on the wall clock.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key`, dropping it first if it has expired
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| now >= entry.expires_at);
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    #[cfg(test)]
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every expired entry
    pub fn purge_expired(&mut self, now: Instant) {
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
