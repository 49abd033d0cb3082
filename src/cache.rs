//! Bounded, thread-safe cache of file contents.
//!
//! The cache maps a resource key (the request URI path) to the bytes last
//! read from disk for it. Capacity is counted in entries; inserting past the
//! limit evicts the least-recently-used entry.
//!
//! # Single-flight reads
//!
//! [`ContentCache::get_or_fetch`] is a read-through operation. Concurrent
//! callers asking for the same uncached key share one fetch:
//!
//! ```text
//!   absent ──claim──▶ being-fetched ──install──▶ present ──evict──▶ (gone)
//!                          │                       ▲  │
//!                          └──fetch failed─▶ absent   └── get/put bump recency
//! ```
//!
//! Only the claim and install steps take the lock. The fetch itself runs
//! outside it, so reads for different keys proceed in parallel.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::io;
use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::CacheError;

/// `None` until the fetching caller publishes its result.
type Outcome = Option<Result<Bytes, CacheError>>;

pub struct ContentCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    lru: LruCache<String, Bytes>,
    in_flight: HashMap<String, watch::Receiver<Outcome>>,
}

enum Claim {
    Hit(Bytes),
    Wait(watch::Receiver<Outcome>),
    Fetch(watch::Sender<Outcome>),
}

impl ContentCache {
    /// Creates a cache holding at most `capacity` entries. A capacity of
    /// zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                lru: LruCache::new(capacity),
                in_flight: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().lru.cap().get()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks residency without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().lru.contains(key)
    }

    /// Resident keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().lru.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Returns the cached bytes for `key` and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let hit = self.inner.lock().lru.get(key).cloned();
        trace!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Inserts or replaces `key`, evicting the least recently used entry if
    /// the cache is over capacity. Never waits for room.
    pub fn put(&self, key: impl Into<String>, bytes: Bytes) {
        self.inner.lock().install(key.into(), bytes);
    }

    /// Returns the bytes for `key`, calling `fetch` on a miss.
    ///
    /// At most one `fetch` runs per key at a time. Callers that arrive while
    /// a fetch for the same key is running wait for it and receive its
    /// result, including its error. A failed fetch leaves the key absent so
    /// the next call retries.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Bytes, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Bytes>>,
    {
        let tx = loop {
            match self.claim(key) {
                Claim::Hit(bytes) => return Ok(bytes),
                Claim::Wait(mut rx) => {
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        // The fetching caller went away without a result.
                        Err(_) => None,
                    };
                    if let Some(result) = outcome {
                        trace!(key, "joined in-flight fetch");
                        return result;
                    }
                }
                Claim::Fetch(tx) => break tx,
            }
        };

        let mut flight = Flight {
            cache: self,
            key,
            tx: Some(tx),
        };

        debug!(key, "cache miss, fetching");
        let result = fetch().await.map_err(|err| CacheError::Fetch {
            key: key.to_string(),
            source: Arc::new(err),
        });
        flight.finish(result.clone());
        result
    }

    fn claim(&self, key: &str) -> Claim {
        let mut inner = self.inner.lock();
        if let Some(bytes) = inner.lru.get(key) {
            return Claim::Hit(bytes.clone());
        }
        if let Some(rx) = inner.in_flight.get(key) {
            return Claim::Wait(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        inner.in_flight.insert(key.to_string(), rx);
        Claim::Fetch(tx)
    }
}

/// Shows capacity and resident keys, most recently used first.
impl fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("capacity", &self.capacity())
            .field("keys", &self.keys())
            .finish()
    }
}

impl CacheInner {
    fn install(&mut self, key: String, bytes: Bytes) {
        if let Some((old_key, _)) = self.lru.push(key.clone(), bytes) {
            if old_key != key {
                debug!(evicted = %old_key, inserted = %key, "cache eviction");
            }
        }
    }
}

/// Owns a claimed key until its fetch completes. Dropping it early (the
/// caller was cancelled or panicked) releases the claim so waiters retry.
struct Flight<'a> {
    cache: &'a ContentCache,
    key: &'a str,
    tx: Option<watch::Sender<Outcome>>,
}

impl Flight<'_> {
    fn finish(&mut self, result: Result<Bytes, CacheError>) {
        {
            let mut inner = self.cache.inner.lock();
            inner.in_flight.remove(self.key);
            if let Ok(bytes) = &result {
                inner.install(self.key.to_string(), bytes.clone());
            }
        }
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(result));
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            self.cache.inner.lock().in_flight.remove(self.key);
        }
    }
}
