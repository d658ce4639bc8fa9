//! deckqa-cache
//!
//! Memoization of retrieval results keyed by the normalized query plus a
//! fingerprint of the retrieval configuration, with TTL freshness, explicit
//! bypass and at-most-one in-flight compute per key.
//!
//! Keys hash with `XxHash64` over `(normalized query, config fingerprint)`
//! so identical normalized queries always hit the same entry and two
//! differently-configured runs never collide.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hasher;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use twox_hash::XxHash64;

use deckqa_core::Result;

/// Collapse case and whitespace so trivially restated queries share an
/// entry.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Slot<V> {
    value: Option<(V, Instant)>,
}

/// TTL query cache with per-key single-flight.
///
/// The outer map lock is held only to fetch or create a key's slot; the
/// per-key lock is held across the compute, which is what makes a second
/// concurrent caller for the same cold key wait for the first result
/// instead of recomputing.
pub struct QueryCache<V> {
    ttl: Duration,
    fingerprint: String,
    slots: Mutex<HashMap<u64, Arc<Mutex<Slot<V>>>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(ttl: Duration, fingerprint: impl Into<String>) -> Self {
        Self {
            ttl,
            fingerprint: fingerprint.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn key_of(&self, query: &str) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(normalize_query(query).as_bytes());
        hasher.write(b"\x1f");
        hasher.write(self.fingerprint.as_bytes());
        hasher.finish()
    }

    async fn slot_for(&self, key: u64) -> Arc<Mutex<Slot<V>>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Slot { value: None })))
            .clone()
    }

    /// Return the cached value for `query` or compute, store and return a
    /// fresh one. The boolean reports whether the value came from cache.
    ///
    /// `bypass` forces a recompute and refreshes the stored entry. An
    /// expired entry is evicted here, on read; there is no background
    /// sweeper.
    pub async fn get_or_compute<F, Fut>(
        &self,
        query: &str,
        bypass: bool,
        compute: F,
    ) -> Result<(V, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let key = self.key_of(query);
        let slot = self.slot_for(key).await;
        let mut guard = slot.lock().await;

        if bypass {
            debug!(key, "cache bypass requested");
        } else if let Some((value, created_at)) = &guard.value {
            if created_at.elapsed() <= self.ttl {
                debug!(key, "cache hit");
                return Ok((value.clone(), true));
            }
            debug!(key, "cache entry expired");
            guard.value = None;
        }

        let value = compute().await?;
        guard.value = Some((value.clone(), Instant::now()));
        debug!(key, "cache store");
        Ok((value, false))
    }

    /// Drop the entry for one query, if present.
    pub async fn invalidate(&self, query: &str) {
        let key = self.key_of(query);
        let slot = { self.slots.lock().await.get(&key).cloned() };
        if let Some(slot) = slot {
            slot.lock().await.value = None;
            debug!(key, "cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
        debug!("cache cleared");
    }

    /// Sweep expired entries for memory hygiene; lazy eviction on read is
    /// the baseline, so calling this is optional. Slots busy with an
    /// in-flight compute are skipped. Returns the number of entries
    /// dropped.
    pub async fn evict_expired(&self) -> usize {
        let slots = self.slots.lock().await;
        let mut dropped = 0;
        for slot in slots.values() {
            if let Ok(mut guard) = slot.try_lock() {
                let expired = guard
                    .value
                    .as_ref()
                    .is_some_and(|(_, created_at)| created_at.elapsed() > self.ttl);
                if expired {
                    guard.value = None;
                    dropped += 1;
                }
            }
        }
        dropped
    }
}
