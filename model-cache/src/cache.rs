//! Bounded, single-flight cache of loaded model sessions
//!
//! Keys are canonical model paths. Concurrent requests for the same key
//! share one load; a failed load is not cached and the next request retries.
//! Once more than `capacity` keys are held, the least recently used loaded
//! entry is dropped; a slot whose load is still running is never evicted.
//! Callers already holding an `Arc` to an evicted value keep it alive
//! until they finish.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

struct Slot<V> {
    cell: Arc<OnceCell<Arc<V>>>,
    last_used: u64,
}

struct CacheState<V> {
    slots: HashMap<PathBuf, Slot<V>>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Counters reported by [`SessionCache::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct SessionCache<V> {
    capacity: usize,
    state: Mutex<CacheState<V>>,
}

impl<V> std::fmt::Debug for SessionCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<V> SessionCache<V> {
    /// `capacity == 0` disables caching: every call loads afresh
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value for `key`, or run `init` to load it.
    ///
    /// At most one `init` runs per key at a time; other callers for the same
    /// key wait for its result.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: &Path, init: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if self.capacity == 0 {
            self.state.lock().misses += 1;
            return init().await.map(Arc::new);
        }

        let cell = self.slot_for(key);

        let mut loaded_here = false;
        let result = cell
            .get_or_try_init(|| async {
                loaded_here = true;
                init().await.map(Arc::new)
            })
            .await
            .map(Arc::clone);

        let mut state = self.state.lock();
        match &result {
            Ok(_) if loaded_here => {
                state.misses += 1;
                log::debug!("Session cache miss: {:?}", key);
                Self::evict_over_capacity(&mut state, self.capacity, key);
            }
            Ok(_) => state.hits += 1,
            Err(_) => {
                state.misses += 1;
                let stale = state
                    .slots
                    .get(key)
                    .map(|slot| Arc::ptr_eq(&slot.cell, &cell) && !slot.cell.initialized())
                    .unwrap_or(false);
                if stale {
                    state.slots.remove(key);
                }
            }
        }

        result
    }

    /// Drop one key; returns true if it was present
    pub fn invalidate(&self, key: &Path) -> bool {
        self.state.lock().slots.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.state.lock().slots.clear();
    }

    /// Number of fully loaded entries
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|slot| slot.cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.state
            .lock()
            .slots
            .get(key)
            .map(|slot| slot.cell.initialized())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            capacity: self.capacity,
            entries: state.slots.values().filter(|slot| slot.cell.initialized()).count(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Fetch or create the slot for `key`, bumping its recency and evicting
    /// the least recently used other key when over capacity.
    fn slot_for(&self, key: &Path) -> Arc<OnceCell<Arc<V>>> {
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        if let Some(slot) = state.slots.get_mut(key) {
            slot.last_used = tick;
            return Arc::clone(&slot.cell);
        }

        let cell = Arc::new(OnceCell::new());
        state.slots.insert(
            key.to_path_buf(),
            Slot {
                cell: Arc::clone(&cell),
                last_used: tick,
            },
        );

        Self::evict_over_capacity(&mut state, self.capacity, key);

        cell
    }

    /// Drop least recently used loaded entries other than `keep` until the
    /// map fits `capacity`. Slots still loading are never evicted, so the map
    /// may stay over capacity until those loads finish.
    fn evict_over_capacity(state: &mut CacheState<V>, capacity: usize, keep: &Path) {
        while state.slots.len() > capacity {
            let victim = state
                .slots
                .iter()
                .filter(|(path, slot)| path.as_path() != keep && slot.cell.initialized())
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(path, _)| path.clone());

            match victim {
                Some(path) => {
                    log::info!("Evicting session for {:?}", path);
                    state.slots.remove(&path);
                    state.evictions += 1;
                }
                None => break,
            }
        }
    }
}
