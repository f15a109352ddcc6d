use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Key/value store whose entries go stale after a fixed time-to-live.
///
/// There is no background eviction: stale entries are simply ignored on read
/// and overwritten by the next successful fetch. One lock guards the whole map.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
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

    /// Returns the cached value when it was stored less than `ttl` before `now`.
    pub fn get(&self, key: &K, now: Instant) -> Option<V> {
        let guard = self.entries.lock();
        let (value, stored_at) = guard.get(key)?;
        if now.saturating_duration_since(*stored_at) < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: K, value: V, now: Instant) {
        self.entries.lock().insert(key, (value, now));
    }

    /// Serve `key` from the cache or run `fetch` exactly once on a miss.
    ///
    /// Only a successful fetch replaces the entry; an error leaves whatever was
    /// stored before untouched and is handed back to the caller.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key, Instant::now()) {
            return Ok(hit);
        }
        let value = fetch().await?;
        self.put(key, value.clone(), Instant::now());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
