use std::collections::{hash_map::Entry, HashMap};
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CacheEntry<V> {
    inserted: Instant,
    value: V,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted.elapsed() < ttl
    }
}

/// A process-wide cache of immutable snapshots, keyed by request parameters.
///
/// Entries expire `ttl` after insertion. A key is either absent or holds a complete
/// value; failed loads are never stored. Values are handed out as clones, so wrap
/// large values in an `Arc`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key` if it has not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Returns the cached value for `key`, or runs `load` and caches its result on success.
    ///
    /// `load` runs without the lock held, so concurrent misses on the same key may
    /// both load; the first one to finish wins and the other result is discarded.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // --- Fast path ---
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        // --- Slow path: load outside the lock ---
        let loaded = load().await?;

        let mut entries = self.entries.lock().await;
        // Evict expired entries so keys that are never asked again do not pile up.
        entries.retain(|_, entry| entry.is_fresh(self.ttl));
        match entries.entry(key) {
            // Someone else inserted while we were loading; use theirs.
            Entry::Occupied(entry) => Ok(entry.get().value.clone()),
            Entry::Vacant(entry) => {
                entry.insert(CacheEntry {
                    inserted: Instant::now(),
                    value: loaded.clone(),
                });
                Ok(loaded)
            }
        }
    }

    /// Number of entries. Expired entries count until the next insert evicts them.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
