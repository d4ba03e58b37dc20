//! Bounded query cache with freshness windows.
//!
//! Entries are tagged with the session generation they were fetched under, so
//! a login or logout makes every earlier result unusable without walking the
//! cache.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
    generation: u64,
}

/// Shared cache handle; clones see the same entries.
#[derive(Debug, Clone)]
pub struct QueryCache<V> {
    entries: Arc<Mutex<LruCache<String, Entry<V>>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry<V>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Value for `key` if it was fetched under `generation` and is younger
    /// than `stale_time`. A zero stale time never yields a hit.
    pub fn get_fresh(&self, key: &str, generation: u64, stale_time: Duration) -> Option<V> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.generation != generation || entry.fetched_at.elapsed() >= stale_time {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, generation: u64, value: V) {
        self.lock().put(
            key.into(),
            Entry {
                value,
                fetched_at: Instant::now(),
                generation,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().pop(key);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let keys: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
