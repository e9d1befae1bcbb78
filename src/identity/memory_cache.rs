/// In-process DID cache
use crate::{
    error::ResolverResult,
    identity::{
        cache::{CacheResult, DidCache, Freshness},
        DidDocument,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

/// Default age after which an entry is revalidated (1 hour)
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(3600);
/// Default age after which an entry is unusable (24 hours)
pub const DEFAULT_MAX_TTL: Duration = Duration::from_secs(86400);

struct Entry {
    doc: Option<DidDocument>,
    updated_at: DateTime<Utc>,
}

/// DID cache backed by a `HashMap`
pub struct MemoryDidCache {
    entries: RwLock<HashMap<String, Entry>>,
    stale_ttl: Duration,
    max_ttl: Duration,
}

impl Default for MemoryDidCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDidCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_ttl: DEFAULT_STALE_TTL,
            max_ttl: DEFAULT_MAX_TTL,
        }
    }

    /// Set custom TTLs
    pub fn with_ttls(mut self, stale_ttl: Duration, max_ttl: Duration) -> Self {
        self.stale_ttl = stale_ttl;
        self.max_ttl = max_ttl;
        self
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DidCache for MemoryDidCache {
    async fn check_cache(&self, did: &str) -> ResolverResult<Option<CacheResult>> {
        let entries = self.entries.read().await;
        Ok(entries.get(did).map(|entry| {
            let age = (Utc::now() - entry.updated_at).to_std().unwrap_or_default();
            CacheResult {
                did: did.to_string(),
                doc: entry.doc.clone(),
                updated_at: entry.updated_at,
                freshness: Freshness::classify(age, self.stale_ttl, self.max_ttl),
            }
        }))
    }

    async fn cache_did(&self, did: &str, doc: Option<&DidDocument>) -> ResolverResult<()> {
        self.entries.write().await.insert(
            did.to_string(),
            Entry {
                doc: doc.cloned(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn clear_entry(&self, did: &str) -> ResolverResult<()> {
        self.entries.write().await.remove(did);
        Ok(())
    }

    async fn clear(&self) -> ResolverResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn cleanup_expired(&self) -> ResolverResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            let age = (now - entry.updated_at).to_std().unwrap_or_default();
            age < self.max_ttl
        });
        Ok((before - entries.len()) as u64)
    }

    async fn count(&self) -> ResolverResult<i64> {
        Ok(self.entries.read().await.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{validate_did_doc, NotFoundPolicy};
    use serde_json::json;

    fn doc(did: &str) -> DidDocument {
        validate_did_doc(did, json!({ "id": did })).unwrap()
    }

    #[tokio::test]
    async fn test_cache_and_check() {
        let cache = MemoryDidCache::new();
        let did = "did:plc:test123";

        assert!(cache.check_cache(did).await.unwrap().is_none());

        cache.cache_did(did, Some(&doc(did))).await.unwrap();
        let cached = cache.check_cache(did).await.unwrap().unwrap();
        assert_eq!(cached.doc.unwrap().id, did);
        assert_eq!(cached.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_tombstone() {
        let cache = MemoryDidCache::new();
        cache.cache_did("did:plc:gone", None).await.unwrap();

        let cached = cache.check_cache("did:plc:gone").await.unwrap().unwrap();
        assert!(cached.doc.is_none());
        assert_eq!(cached.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_stale_and_expired() {
        let did = "did:web:example.com";

        let stale = MemoryDidCache::new().with_ttls(Duration::ZERO, Duration::from_secs(60));
        stale.cache_did(did, Some(&doc(did))).await.unwrap();
        let cached = stale.check_cache(did).await.unwrap().unwrap();
        assert_eq!(cached.freshness, Freshness::Stale);

        let expired = MemoryDidCache::new().with_ttls(Duration::ZERO, Duration::ZERO);
        expired.cache_did(did, Some(&doc(did))).await.unwrap();
        let cached = expired.check_cache(did).await.unwrap().unwrap();
        assert_eq!(cached.freshness, Freshness::Expired);
    }

    #[tokio::test]
    async fn test_clear_entry() {
        let cache = MemoryDidCache::new();
        cache.cache_did("did:plc:a", Some(&doc("did:plc:a"))).await.unwrap();
        cache.cache_did("did:plc:b", Some(&doc("did:plc:b"))).await.unwrap();

        cache.clear_entry("did:plc:a").await.unwrap();
        assert!(cache.check_cache("did:plc:a").await.unwrap().is_none());
        assert_eq!(cache.len().await, 1);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_keeps_entry_on_error() {
        let cache = MemoryDidCache::new().with_ttls(Duration::ZERO, Duration::from_secs(60));
        let did = "did:plc:keep";
        cache.cache_did(did, Some(&doc(did))).await.unwrap();
        let previous = cache.check_cache(did).await.unwrap().unwrap();

        let refetch: crate::identity::cache::RefetchFn = Box::new(|| {
            Box::pin(async { Err(crate::error::ResolverError::Timeout("test".into())) })
        });
        let result = cache
            .refresh_cache(did, refetch, previous, NotFoundPolicy::Clear)
            .await;
        assert!(result.is_err());
        assert!(cache.check_cache(did).await.unwrap().unwrap().doc.is_some());
    }

    #[tokio::test]
    async fn test_refresh_clears_on_not_found() {
        let cache = MemoryDidCache::new();
        let did = "did:plc:deleted";
        cache.cache_did(did, Some(&doc(did))).await.unwrap();
        let previous = cache.check_cache(did).await.unwrap().unwrap();

        let refetch: crate::identity::cache::RefetchFn =
            Box::new(|| Box::pin(async { Ok(None) }));
        cache
            .refresh_cache(did, refetch, previous, NotFoundPolicy::Clear)
            .await
            .unwrap();
        assert!(cache.check_cache(did).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_renews_tombstone() {
        let cache = MemoryDidCache::new().with_ttls(Duration::ZERO, Duration::from_secs(60));
        let did = "did:plc:stillgone";
        cache.cache_did(did, None).await.unwrap();
        let previous = cache.check_cache(did).await.unwrap().unwrap();

        let refetch: crate::identity::cache::RefetchFn =
            Box::new(|| Box::pin(async { Ok(None) }));
        cache
            .refresh_cache(did, refetch, previous.clone(), NotFoundPolicy::Tombstone)
            .await
            .unwrap();

        let renewed = cache.check_cache(did).await.unwrap().unwrap();
        assert!(renewed.doc.is_none());
        assert!(renewed.updated_at >= previous.updated_at);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = MemoryDidCache::new().with_ttls(Duration::ZERO, Duration::ZERO);
        for i in 0..50 {
            cache.cache_did(&format!("did:plc:unknown{}", i), None).await.unwrap();
        }
        assert_eq!(cache.count().await.unwrap(), 50);

        assert_eq!(cache.cleanup_expired().await.unwrap(), 50);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_entries() {
        let cache = MemoryDidCache::new();
        cache.cache_did("did:plc:live", Some(&doc("did:plc:live"))).await.unwrap();

        assert_eq!(cache.cleanup_expired().await.unwrap(), 0);
        assert_eq!(cache.count().await.unwrap(), 1);
    }
}
