//! Time-bounded in-memory cache.
//!
//! An explicit, injectable memoization table with a defined expiry policy:
//! entries live for a fixed TTL and can be busted on demand.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A simple TTL cache keyed by `K`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, (V, Instant)>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Get a live entry, if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|(value, inserted_at)| {
            if inserted_at.elapsed() < self.ttl {
                Some(value.clone())
            } else {
                None
            }
        })
    }

    /// Insert or replace an entry, resetting its TTL.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Remove a single entry.
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop all expired entries.
    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);
    }

    /// Number of entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
