//! In-memory TTL cache for API responses
//!
//! Entries expire a fixed time after insertion. Expiry is checked lazily on
//! read: a stale entry is evicted by the `get` that finds it, and an entry
//! that is never read again stays until `clear` or drop.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;
use url::Url;

/// Default time-to-live in minutes
pub const DEFAULT_TTL_MINUTES: u64 = 5;

/// A cached value and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    inserted_at: Instant,
}

/// Thread-safe key/value store with a single time-to-live for all entries
///
/// The read-check-evict sequence in [`TtlCache::get`] runs under one lock, so
/// concurrent readers and writers never observe a half-evicted entry.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    /// Creates a cache whose entries live for `ttl_minutes`.
    pub fn new(ttl_minutes: u64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_minutes.saturating_mul(60)))
    }

    /// Creates a cache with an arbitrary time-to-live.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value for `key` if it is younger than the TTL.
    ///
    /// A stale entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            return Some(entry.data.clone());
        }
        trace!(key, "Evicting stale cache entry");
        entries.remove(key);
        None
    }

    /// Stores `data` under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, data: T) {
        self.entries.lock().insert(
            key.into(),
            CacheEntry {
                data,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes a single entry.
    pub fn remove(&self, key: &str) -> Option<T> {
        self.entries.lock().remove(key).map(|e| e.data)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MINUTES)
    }
}

/// Builds a cache key from a URL with its query pairs sorted, so two
/// requests that differ only in parameter order share an entry.
pub fn cache_key(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    let mut canonical = url.clone();
    canonical.set_fragment(None);
    if pairs.is_empty() {
        canonical.set_query(None);
    } else {
        canonical.query_pairs_mut().clear().extend_pairs(pairs);
    }
    canonical.to_string()
}
