//! Caching layer for idempotent directory reads.
//!
//! Each read family (station search, top stations, latest stations) owns
//! one [`TtlCache`] with its own key space. Entries expire a fixed time
//! after insertion and are evicted lazily when looked up. When an insert
//! would push an instance over its bound, the whole instance is cleared
//! before the new entry goes in. The realistic query space is small, so a
//! full clear is enough.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};

/// Per-call cache control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Skip the lookup and the write-through for this call only.
    /// Existing entries are left untouched.
    pub bypass_cache: bool,
}

impl CacheOptions {
    /// Options that force a fresh fetch.
    pub fn bypass() -> Self {
        Self { bypass_cache: true }
    }
}

/// Cached payload with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    inserted_at: Instant,
    payload: V,
}

/// TTL-bounded string-keyed store.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given TTL and entry bound.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or overwrite an entry.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Number of stored entries, including any not yet evicted as stale.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if now.saturating_duration_since(entry.inserted_at) > self.ttl {
            trace!(key, "Cache entry expired");
            entries.remove(key);
            return None;
        }

        trace!(key, "Cache hit");
        Some(entry.payload.clone())
    }

    fn put_at(&self, key: impl Into<String>, value: V, now: Instant) {
        let key = key.into();
        let mut entries = self.entries.lock();
        // A new key that would push the map past its bound clears it first.
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            trace!(capacity = self.capacity, "Cache over capacity, clearing");
            entries.clear();
        }
        entries.insert(
            key,
            CacheEntry {
                inserted_at: now,
                payload: value,
            },
        );
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}
