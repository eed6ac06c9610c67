//! Read-through cache for order queries
//!
//! Sits in front of the ledger's read path, keyed by query shape. Entries
//! expire after a short TTL and the whole cache is dropped on every
//! successful order mutation, so correctness never depends on it. The
//! ledger itself stays cache-free.

use cached::stores::TimedCache;
use cached::Cached;
use std::sync::Mutex;

use crate::ledger::OrderView;
use crate::models::OrderStatus;

/// Cache key for the full order listing.
pub const KEY_ALL: &str = "all";

/// Cache key for a by-status listing.
pub fn status_key(status: OrderStatus) -> String {
    format!("status:{}", status)
}

/// TTL + invalidate-on-write cache over order views
pub struct OrderReadCache {
    lists: Mutex<TimedCache<String, Vec<OrderView>>>,
    singles: Mutex<TimedCache<i64, OrderView>>,
}

impl OrderReadCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            lists: Mutex::new(TimedCache::with_lifespan(ttl_seconds)),
            singles: Mutex::new(TimedCache::with_lifespan(ttl_seconds)),
        }
    }

    pub fn get_list(&self, key: &str) -> Option<Vec<OrderView>> {
        let mut cache = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        cache.cache_get(&key.to_string()).cloned()
    }

    pub fn put_list(&self, key: String, views: Vec<OrderView>) {
        let mut cache = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        cache.cache_set(key, views);
    }

    pub fn get_order(&self, id: i64) -> Option<OrderView> {
        let mut cache = self.singles.lock().unwrap_or_else(|e| e.into_inner());
        cache.cache_get(&id).cloned()
    }

    pub fn put_order(&self, view: OrderView) {
        let mut cache = self.singles.lock().unwrap_or_else(|e| e.into_inner());
        cache.cache_set(view.id, view);
    }

    /// Drop every entry. Called after any successful order mutation.
    pub fn invalidate_all(&self) {
        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cache_clear();
        self.singles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cache_clear();
        tracing::debug!("order read cache invalidated");
    }
}
