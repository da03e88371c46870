use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageResult};
use crate::time::{Clock, SystemClock};

/// Default time-to-live for cached responses (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Storage key prefix for cache envelopes.
const CACHE_PREFIX: &str = "@cache:";

/// Persisted cache envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEnvelope {
    data: serde_json::Value,
    cached_at_ms: u64,
    ttl_ms: u64,
    #[serde(default)]
    tags: Vec<String>,
}

impl CacheEnvelope {
    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.cached_at_ms) > self.ttl_ms
    }
}

/// Result of a non-evicting [`CacheStore::lookup`].
///
/// One envelope read answering both questions a caller has: is there a
/// value, and is it still fresh. Keeping the stale value in hand matters
/// because the evicting [`get`](CacheStore::get) would destroy exactly
/// the entry an offline/error fallback wants to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// Present and within its TTL.
    Fresh(T),
    /// Present but past its TTL.
    Stale(T),
    /// Absent (or unreadable).
    Miss,
}

/// TTL-keyed response cache.
///
/// Callers cannot distinguish "never cached" from "expired and evicted":
/// both read as `None`, and both mean the same thing to them — fetch
/// fresh.
pub struct CacheStore<C: Clock = SystemClock> {
    store: Arc<dyn KeyValueStore>,
    clock: C,
    default_ttl: Duration,
}

impl CacheStore<SystemClock> {
    /// Create a cache over the given store with the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> CacheStore<C> {
    /// Create a cache with a custom clock (useful for testing).
    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: C) -> Self {
        Self { store, clock, default_ttl: DEFAULT_TTL }
    }

    /// Override the default TTL applied when `set` is called without one.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn storage_key(key: &str) -> String {
        format!("{CACHE_PREFIX}{key}")
    }

    /// Cache a value without tags.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> StorageResult<()> {
        self.set_tagged(key, value, ttl, &[]).await
    }

    /// Cache a value with invalidation tags.
    pub async fn set_tagged<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        tags: &[String],
    ) -> StorageResult<()> {
        let envelope = CacheEnvelope {
            data: serde_json::to_value(value)?,
            cached_at_ms: self.clock.millis_since_epoch(),
            ttl_ms: ttl.unwrap_or(self.default_ttl).as_millis() as u64,
            tags: tags.to_vec(),
        };

        let json = serde_json::to_string(&envelope)?;
        self.store.set(&Self::storage_key(key), &json).await?;
        debug!(key = %key, ttl_ms = envelope.ttl_ms, "cache entry stored");
        Ok(())
    }

    /// Fetch a fresh cached value.
    ///
    /// Lazy expiry: an entry past its TTL is deleted here and reads as
    /// `None`. Unparseable envelopes are treated the same way.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read_envelope(key).await? {
            Some(envelope) if envelope.is_expired(self.clock.millis_since_epoch()) => {
                debug!(key = %key, "cache entry expired, evicting");
                self.store.remove(&Self::storage_key(key)).await?;
                Ok(None)
            }
            Some(envelope) => self.decode(key, envelope).await,
            None => Ok(None),
        }
    }

    /// Fetch a cached value ignoring its TTL.
    ///
    /// Offline/error fallback path: stale data beats no data.
    pub async fn get_stale<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read_envelope(key).await? {
            Some(envelope) => self.decode(key, envelope).await,
            None => Ok(None),
        }
    }

    /// Read an entry without evicting it, reporting its freshness.
    ///
    /// Used by callers that may still want the stale value after
    /// deciding to fetch fresh — the entry is left in place either way.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> StorageResult<CacheLookup<T>> {
        let Some(envelope) = self.read_envelope(key).await? else {
            return Ok(CacheLookup::Miss);
        };

        let expired = envelope.is_expired(self.clock.millis_since_epoch());
        match self.decode(key, envelope).await? {
            Some(value) if expired => Ok(CacheLookup::Stale(value)),
            Some(value) => Ok(CacheLookup::Fresh(value)),
            None => Ok(CacheLookup::Miss),
        }
    }

    async fn read_envelope(&self, key: &str) -> StorageResult<Option<CacheEnvelope>> {
        let Some(json) = self.store.get(&Self::storage_key(key)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<CacheEnvelope>(&json) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(e) => {
                warn!(key = %key, error = %e, "unparseable cache envelope, evicting");
                self.store.remove(&Self::storage_key(key)).await?;
                Ok(None)
            }
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        key: &str,
        envelope: CacheEnvelope,
    ) -> StorageResult<Option<T>> {
        match serde_json::from_value(envelope.data) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "cached payload no longer decodes, evicting");
                self.store.remove(&Self::storage_key(key)).await?;
                Ok(None)
            }
        }
    }

    /// Remove a single entry.
    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        self.store.remove(&Self::storage_key(key)).await
    }

    /// Drop every cache-prefixed key.
    pub async fn clear(&self) -> StorageResult<usize> {
        let keys = self.store.keys_with_prefix(CACHE_PREFIX).await?;
        let count = keys.len();
        for key in keys {
            self.store.remove(&key).await?;
        }
        debug!(count, "cache cleared");
        Ok(count)
    }

    /// Sweep: drop every entry whose age exceeds its own TTL.
    ///
    /// Returns the number of entries removed. Unparseable envelopes are
    /// dropped as part of the sweep.
    pub async fn clear_expired(&self) -> StorageResult<usize> {
        let now_ms = self.clock.millis_since_epoch();
        let mut removed = 0;

        for storage_key in self.store.keys_with_prefix(CACHE_PREFIX).await? {
            let Some(json) = self.store.get(&storage_key).await? else {
                continue;
            };

            let expired = match serde_json::from_str::<CacheEnvelope>(&json) {
                Ok(envelope) => envelope.is_expired(now_ms),
                Err(_) => true,
            };

            if expired {
                self.store.remove(&storage_key).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "expired cache entries swept");
        }
        Ok(removed)
    }

    /// Drop every entry carrying the given tag.
    pub async fn invalidate_tag(&self, tag: &str) -> StorageResult<usize> {
        self.invalidate_tags(&[tag.to_string()]).await
    }

    /// Drop every entry carrying any of the given tags.
    pub async fn invalidate_tags(&self, tags: &[String]) -> StorageResult<usize> {
        if tags.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for storage_key in self.store.keys_with_prefix(CACHE_PREFIX).await? {
            let Some(json) = self.store.get(&storage_key).await? else {
                continue;
            };

            let matches = match serde_json::from_str::<CacheEnvelope>(&json) {
                Ok(envelope) => envelope.tags.iter().any(|t| tags.contains(t)),
                // An envelope we cannot parse cannot prove it is unrelated
                Err(_) => true,
            };

            if matches {
                self.store.remove(&storage_key).await?;
                removed += 1;
            }
        }

        debug!(?tags, removed, "cache entries invalidated by tag");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::time::MockClock;

    fn cache_with_mock_clock() -> (CacheStore<MockClock>, MockClock) {
        let clock = MockClock::new();
        let cache = CacheStore::with_clock(Arc::new(MemoryStore::new()), clock.clone());
        (cache, clock)
    }

    /// Validates `CacheStore::get` behavior for the fresh-entry scenario.
    ///
    /// Assertions:
    /// - Confirms a value cached with a positive TTL is returned
    ///   immediately.
    #[tokio::test]
    async fn test_fresh_entry_returned() {
        let (cache, _clock) = cache_with_mock_clock();

        cache.set("GET:/groups", &vec![1, 2, 3], Some(Duration::from_secs(60))).await.unwrap();

        let hit: Option<Vec<i32>> = cache.get("GET:/groups").await.unwrap();
        assert_eq!(hit, Some(vec![1, 2, 3]));
    }

    /// Validates `CacheStore::get` behavior for the lazy-expiry scenario.
    ///
    /// Assertions:
    /// - Confirms a read past the TTL returns `None`.
    /// - Confirms the expired entry is physically deleted by the read.
    #[tokio::test]
    async fn test_lazy_expiry_evicts() {
        let store = Arc::new(MemoryStore::new());
        let clock = MockClock::new();
        let cache = CacheStore::with_clock(store.clone() as Arc<dyn KeyValueStore>, clock.clone());

        cache.set("k", &"v", Some(Duration::from_millis(100))).await.unwrap();
        clock.advance_millis(150);

        let miss: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(miss, None);
        assert_eq!(store.get("@cache:k").await.unwrap(), None);
    }

    /// Validates `CacheStore::lookup` behavior across freshness states.
    ///
    /// Assertions:
    /// - Confirms a live entry reads `Fresh` and an aged one `Stale`.
    /// - Confirms the stale entry is NOT evicted by the lookup.
    /// - Confirms an absent key reads `Miss`.
    #[tokio::test]
    async fn test_lookup_reports_freshness_without_evicting() {
        let (cache, clock) = cache_with_mock_clock();

        cache.set("k", &"v", Some(Duration::from_millis(100))).await.unwrap();
        assert_eq!(
            cache.lookup::<String>("k").await.unwrap(),
            CacheLookup::Fresh("v".to_string())
        );

        clock.advance_millis(500);
        assert_eq!(
            cache.lookup::<String>("k").await.unwrap(),
            CacheLookup::Stale("v".to_string())
        );
        // Still readable: lookup must not evict
        assert_eq!(
            cache.lookup::<String>("k").await.unwrap(),
            CacheLookup::Stale("v".to_string())
        );

        assert_eq!(cache.lookup::<String>("ghost").await.unwrap(), CacheLookup::<String>::Miss);
    }

    /// Validates `CacheStore::get_stale` behavior for the offline-fallback
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms an expired entry is still readable through the stale
    ///   path.
    #[tokio::test]
    async fn test_stale_read_ignores_ttl() {
        let (cache, clock) = cache_with_mock_clock();

        cache.set("k", &"v", Some(Duration::from_millis(100))).await.unwrap();
        clock.advance_millis(10_000);

        let stale: Option<String> = cache.get_stale("k").await.unwrap();
        assert_eq!(stale, Some("v".to_string()));
    }

    /// Validates `CacheStore::clear_expired` behavior for the sweep
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms only entries past their own TTL are removed.
    /// - Confirms the survivor is still a fresh hit afterwards.
    #[tokio::test]
    async fn test_sweep_respects_per_entry_ttl() {
        let (cache, clock) = cache_with_mock_clock();

        cache.set("short", &1, Some(Duration::from_millis(50))).await.unwrap();
        cache.set("long", &2, Some(Duration::from_secs(3600))).await.unwrap();
        clock.advance_millis(200);

        let removed = cache.clear_expired().await.unwrap();
        assert_eq!(removed, 1);

        let survivor: Option<i32> = cache.get("long").await.unwrap();
        assert_eq!(survivor, Some(2));
    }

    /// Validates `CacheStore::invalidate_tags` behavior for the tagged
    /// mutation scenario.
    ///
    /// Assertions:
    /// - Confirms entries sharing an invalidated tag are dropped.
    /// - Confirms untagged/unrelated entries survive.
    #[tokio::test]
    async fn test_tag_invalidation() {
        let (cache, _clock) = cache_with_mock_clock();

        cache
            .set_tagged("GET:/groups", &"groups", None, &["groups".to_string()])
            .await
            .unwrap();
        cache
            .set_tagged("GET:/groups/my-groups", &"mine", None, &["groups".to_string()])
            .await
            .unwrap();
        cache
            .set_tagged("GET:/payments/history", &"payments", None, &["payments".to_string()])
            .await
            .unwrap();

        let removed = cache.invalidate_tag("groups").await.unwrap();
        assert_eq!(removed, 2);

        let gone: Option<String> = cache.get("GET:/groups").await.unwrap();
        assert_eq!(gone, None);
        let kept: Option<String> = cache.get("GET:/payments/history").await.unwrap();
        assert_eq!(kept, Some("payments".to_string()));
    }

    /// Validates `CacheStore::clear` behavior.
    ///
    /// Assertions:
    /// - Confirms every cache-prefixed key is dropped.
    /// - Confirms non-cache keys in the same store are untouched.
    #[tokio::test]
    async fn test_clear_only_touches_cache_keys() {
        let store = Arc::new(MemoryStore::new());
        store.set("@offline_queue", "[]").await.unwrap();
        let cache = CacheStore::new(store.clone() as Arc<dyn KeyValueStore>);

        cache.set("a", &1, None).await.unwrap();
        cache.set("b", &2, None).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(store.get("@offline_queue").await.unwrap(), Some("[]".to_string()));
    }

    /// Validates `CacheStore::get` behavior for the corrupt envelope
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms garbage under a cache key reads as `None` and is
    ///   evicted.
    #[tokio::test]
    async fn test_corrupt_envelope_treated_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set("@cache:bad", "{not json").await.unwrap();
        let cache = CacheStore::new(store.clone() as Arc<dyn KeyValueStore>);

        let miss: Option<String> = cache.get("bad").await.unwrap();
        assert_eq!(miss, None);
        assert_eq!(store.get("@cache:bad").await.unwrap(), None);
    }
}
