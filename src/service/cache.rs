//! Time-bounded context cache

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::entity::UserAuthContext;
use crate::types::UserId;

/// Default time-to-live for cached contexts
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default cap on distinct cached users
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached contexts
    pub ttl: Duration,

    /// Hard cap on distinct cached users
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

struct CacheEntry {
    context: Arc<UserAuthContext>,
    cached_at: Instant,
}

impl CacheEntry {
    fn new(context: Arc<UserAuthContext>) -> Self {
        Self {
            context,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub evictions: usize,
    pub invalidations: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    /// Cache hit rate over all lookups so far.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<UserId, CacheEntry>,
    /// Insertion order for eviction; never holds duplicates or stale ids.
    order: VecDeque<UserId>,
    hits: usize,
    misses: usize,
    expirations: usize,
    evictions: usize,
    invalidations: usize,
}

/// Per-user context cache with TTL and a hard size cap.
///
/// Eviction at capacity removes the oldest-inserted entry, not the least
/// recently used one. The map, the insertion-order queue, and the counters
/// live under one lock so that check, evict, and insert form a single
/// critical section and concurrent misses cannot exceed the cap.
pub struct ContextCache {
    inner: RwLock<CacheInner>,
    config: CacheConfig,
}

impl ContextCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            config,
        }
    }

    /// Return the cached context for `user_id` if present and fresh.
    ///
    /// An expired entry is removed on sight and counts as a miss.
    pub async fn get(&self, user_id: &str) -> Option<Arc<UserAuthContext>> {
        let mut inner = self.inner.write().await;

        let state = inner
            .entries
            .get(user_id)
            .map(|entry| (entry.is_expired(self.config.ttl), entry.context.clone()));

        match state {
            Some((false, context)) => {
                inner.hits += 1;
                Some(context)
            }
            Some((true, _)) => {
                inner.entries.remove(user_id);
                inner.order.retain(|id| id != user_id);
                inner.expirations += 1;
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a freshly resolved context, evicting the oldest entry first if
    /// the cache is at capacity.
    pub async fn insert(&self, user_id: &str, context: Arc<UserAuthContext>) {
        let mut inner = self.inner.write().await;

        if !inner.entries.contains_key(user_id) && inner.entries.len() >= self.config.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                inner.evictions += 1;
            }
        }

        if inner
            .entries
            .insert(user_id.to_string(), CacheEntry::new(context))
            .is_none()
        {
            inner.order.push_back(user_id.to_string());
        }
    }

    /// Drop the entry for one user. Returns whether an entry existed.
    pub async fn invalidate(&self, user_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        if inner.entries.remove(user_id).is_some() {
            inner.order.retain(|id| id != user_id);
            inner.invalidations += 1;
            true
        } else {
            false
        }
    }

    /// Drop every entry.
    pub async fn invalidate_all(&self) {
        let mut inner = self.inner.write().await;
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.invalidations += dropped;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            expirations: inner.expirations,
            evictions: inner.evictions,
            invalidations: inner.invalidations,
            entries: inner.entries.len(),
            max_entries: self.config.capacity,
        }
    }
}
