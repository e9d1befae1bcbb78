/// DID Cache - port consumed by the resolver
///
/// Implementations own the freshness policy; the resolver only reacts to
/// the classification it is handed.
use crate::{error::ResolverResult, identity::DidDocument};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::time::Duration;

/// Freshness of a cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve as-is
    Fresh,
    /// Serve, but revalidate in the background
    Stale,
    /// Unusable, refetch before answering
    Expired,
}

impl Freshness {
    /// Classify an entry by age against stale/max TTLs
    pub fn classify(age: Duration, stale_ttl: Duration, max_ttl: Duration) -> Self {
        if age >= max_ttl {
            Freshness::Expired
        } else if age >= stale_ttl {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Expired => "expired",
        }
    }
}

/// A cache lookup result
#[derive(Debug, Clone)]
pub struct CacheResult {
    pub did: String,
    /// `None` is a tombstone: the DID was confirmed to have no document
    pub doc: Option<DidDocument>,
    pub updated_at: DateTime<Utc>,
    pub freshness: Freshness,
}

/// What a "no such document" outcome does to the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Remove the entry
    #[default]
    Clear,
    /// Overwrite the entry with a tombstone
    Tombstone,
}

impl NotFoundPolicy {
    pub fn from_negative_caching(negative_caching: bool) -> Self {
        if negative_caching {
            NotFoundPolicy::Tombstone
        } else {
            NotFoundPolicy::Clear
        }
    }
}

/// Refetch callback handed to `refresh_cache`
pub type RefetchFn =
    Box<dyn FnOnce() -> BoxFuture<'static, ResolverResult<Option<DidDocument>>> + Send>;

/// Storage behind resolved DID documents
///
/// Must be safe for concurrent reads and writes; the resolver does no
/// per-DID coordination and the last write wins.
#[async_trait]
pub trait DidCache: Send + Sync {
    /// Look up a DID
    async fn check_cache(&self, did: &str) -> ResolverResult<Option<CacheResult>>;

    /// Store a document, or a tombstone when `doc` is `None`
    async fn cache_did(&self, did: &str, doc: Option<&DidDocument>) -> ResolverResult<()>;

    /// Remove a DID's entry
    async fn clear_entry(&self, did: &str) -> ResolverResult<()>;

    /// Remove all entries
    async fn clear(&self) -> ResolverResult<()>;

    /// Drop entries past the max TTL, returning how many were removed
    async fn cleanup_expired(&self) -> ResolverResult<u64>;

    /// Number of entries currently held, tombstones included
    async fn count(&self) -> ResolverResult<i64>;

    /// Record a resolution outcome
    async fn reconcile(
        &self,
        did: &str,
        doc: Option<&DidDocument>,
        not_found: NotFoundPolicy,
    ) -> ResolverResult<()> {
        match (doc, not_found) {
            (Some(doc), _) => self.cache_did(did, Some(doc)).await,
            (None, NotFoundPolicy::Tombstone) => self.cache_did(did, None).await,
            (None, NotFoundPolicy::Clear) => self.clear_entry(did).await,
        }
    }

    /// Revalidate a stale entry
    ///
    /// A refetch error leaves the previous entry in place.
    async fn refresh_cache(
        &self,
        did: &str,
        refetch: RefetchFn,
        _previous: CacheResult,
        not_found: NotFoundPolicy,
    ) -> ResolverResult<()> {
        let doc = refetch().await?;
        self.reconcile(did, doc.as_ref(), not_found).await
    }
}
