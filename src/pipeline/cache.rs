//! Bounded LRU cache of intermediate pipeline results.
//!
//! Keys combine a content fingerprint of the source payload with the ordered signatures of the
//! steps applied so far, so two pipelines sharing a prefix share cached results for it. The cache
//! only ever holds outputs of fully completed steps; a cold cache yields the same bytes as a warm
//! one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::media::fingerprint::Fingerprint;
use crate::media::frame::MediaPayload;

/// Operation id plus canonical parameter encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct StepSignature {
    /// Operation id.
    pub operation: String,
    /// Canonical JSON of the validated parameters.
    pub params: String,
}

/// Source fingerprint plus every step signature up to and including this step.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    media: Fingerprint,
    prefix: Vec<StepSignature>,
}

impl CacheKey {
    /// Key for `prefix` applied to the media fingerprinted as `media`.
    pub fn new(media: Fingerprint, prefix: &[StepSignature]) -> Self {
        Self {
            media,
            prefix: prefix.to_vec(),
        }
    }

    /// Fingerprint of the source payload.
    pub fn media(&self) -> Fingerprint {
        self.media
    }

    /// Step signatures in execution order.
    pub fn prefix(&self) -> &[StepSignature] {
        &self.prefix
    }
}

/// Point-in-time counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Entries held.
    pub entries: usize,
    /// Pixel bytes held.
    pub bytes: u64,
    /// Entry budget.
    pub max_entries: usize,
    /// Byte budget.
    pub max_bytes: u64,
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries stored.
    pub inserts: u64,
    /// Entries dropped to stay within budget.
    pub evictions: u64,
}

struct Inner {
    lru: LruCache<CacheKey, Arc<MediaPayload>>,
    bytes: u64,
    hits: u64,
    misses: u64,
    inserts: u64,
    evictions: u64,
}

/// Thread-safe result cache bounded by entry count and payload bytes.
///
/// Concurrent `put`s on one key resolve as last writer wins; both writers computed the same
/// deterministic payload.
pub struct ResultCache {
    inner: Mutex<Inner>,
    enabled: bool,
    max_entries: usize,
    max_bytes: u64,
}

impl ResultCache {
    /// Cache bounded by entry count and total pixel bytes.
    pub fn new(max_entries: usize, max_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                lru: LruCache::unbounded(),
                bytes: 0,
                hits: 0,
                misses: 0,
                inserts: 0,
                evictions: 0,
            }),
            enabled: max_entries > 0 && max_bytes > 0,
            max_entries,
            max_bytes,
        }
    }

    /// Cache that stores nothing; every lookup misses.
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    /// Whether results are stored at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Entries are replaced whole, so a panic elsewhere cannot leave one half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached result for `key`, marking it recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<MediaPayload>> {
        if !self.enabled {
            return None;
        }
        let mut inner = self.lock();
        match inner.lru.get(key).cloned() {
            Some(hit) => {
                inner.hits += 1;
                tracing::debug!(depth = key.prefix.len(), media = %key.media, "cache hit");
                Some(hit)
            }
            None => {
                inner.misses += 1;
                tracing::debug!(depth = key.prefix.len(), media = %key.media, "cache miss");
                None
            }
        }
    }

    /// Membership test that neither promotes the entry nor touches the counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.enabled && self.lock().lru.contains(key)
    }

    /// Store a result; the last writer wins on a racing key.
    pub fn put(&self, key: CacheKey, payload: Arc<MediaPayload>) {
        if !self.enabled {
            return;
        }
        let size = payload.byte_len() as u64;
        if size > self.max_bytes {
            tracing::debug!(size, max_bytes = self.max_bytes, "payload exceeds cache budget");
            return;
        }

        let mut inner = self.lock();
        if let Some(old) = inner.lru.put(key, payload) {
            inner.bytes -= old.byte_len() as u64;
        }
        inner.bytes += size;
        inner.inserts += 1;

        while inner.lru.len() > self.max_entries || inner.bytes > self.max_bytes {
            let Some((evicted, payload)) = inner.lru.pop_lru() else {
                break;
            };
            inner.bytes -= payload.byte_len() as u64;
            inner.evictions += 1;
            tracing::debug!(depth = evicted.prefix.len(), media = %evicted.media, "cache evict");
        }
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.lru.clear();
        inner.bytes = 0;
    }

    /// Entries held.
    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of occupancy and counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.lru.len(),
            bytes: inner.bytes,
            max_entries: self.max_entries,
            max_bytes: self.max_bytes,
            hits: inner.hits,
            misses: inner.misses,
            inserts: inner.inserts,
            evictions: inner.evictions,
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/cache.rs"]
mod tests;
