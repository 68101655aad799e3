//! Bounded in-memory reply cache with lazy TTL expiry.
//!
//! The cache is a pure accelerator for the chat endpoint: disabling it never
//! changes the correctness of a response, only its latency and provider cost.
//! Keys are approximate fingerprints of the latest user message (see
//! [`compute_key`]), entries expire on read after the TTL, and once the map
//! grows past its capacity the oldest-inserted entry is dropped (insertion
//! order, not LRU-by-access).


use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::chat::{ChatMessage, Role};

/// Constant tag prefixed to every cache key.
const KEY_TAG: &str = "chat";

/// Number of characters of the latest user message that feed the fingerprint.
const KEY_PREFIX_CHARS: usize = 50;

/// Derives the cache fingerprint for a conversation.
///
/// Returns `None` when no user-role message exists (the cache is bypassed
/// entirely in that case). Otherwise the last user message is truncated to
/// [`KEY_PREFIX_CHARS`] characters, runs of whitespace are collapsed to a
/// single separator, and the result is prefixed with [`KEY_TAG`].
///
/// Two requests whose last user message shares the same 50-character prefix
/// deliberately collide: this is approximate fingerprinting, a known
/// hit-rate/staleness trade-off, not exact matching.
pub fn compute_key(messages: &[ChatMessage]) -> Option<String> {
    let last_user = messages.iter().rev().find(|m| m.role == Role::User)?;

    let prefix: String = last_user.content.chars().take(KEY_PREFIX_CHARS).collect();
    let collapsed = prefix.split_whitespace().collect::<Vec<_>>().join("_");

    Some(format!("{KEY_TAG}:{collapsed}"))
}

struct CacheEntry {
    value: String,
    created_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; front is the eviction candidate.
    order: VecDeque<String>,
}

/// Bounded reply cache, constructed once per process and shared by handlers.
///
/// All mutation happens under a single mutex so the get/evict/put sequence
/// is atomic under the multi-threaded runtime.
pub struct ReplyCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReplyCache {
    /// Default maximum number of entries.
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Default entry time-to-live.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Creates a cache with explicit capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached reply for `key` if present and fresh.
    ///
    /// Expired entries are removed during the read (lazy expiry, no
    /// background sweep).
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                let value = entry.value.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Inserts or overwrites a reply.
    ///
    /// Overwriting an existing key refreshes its timestamp but keeps its
    /// original insertion position. When the map exceeds capacity after an
    /// insert, the single oldest-inserted entry is evicted.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut inner = self.inner.lock();

        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };

        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }

    /// Returns the number of live entries (expired-but-unread included).
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lifetime hit count (for observability).
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lifetime miss count (for observability).
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for ReplyCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_TTL)
    }
}

impl std::fmt::Debug for ReplyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}
