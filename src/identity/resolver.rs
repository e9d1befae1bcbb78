/// DID Resolver - Orchestrates did:web and did:plc resolution with caching
///
/// Resolution order:
/// 1. Check cache (fresh: return, stale: return and revalidate in background)
/// 2. Fetch from the method's source on miss or expiry
/// 3. Reconcile the outcome into the cache (errors are never cached)
///
/// One `timeout` budget covers the cache read, the upstream fetch and the
/// cache write of a single `resolve` call.
use crate::{
    error::{ResolverError, ResolverResult},
    identity::{
        cache::{CacheResult, DidCache, Freshness, NotFoundPolicy, RefetchFn},
        did::DidMethod,
        document::DidDocument,
        fetch::build_client,
        plc::{resolve_did_plc, DEFAULT_PLC_URL},
        web::resolve_did_web,
    },
    metrics,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// DID resolver options
#[derive(Clone)]
pub struct DidResolverOpts {
    /// PLC directory base URL
    pub plc_url: String,
    /// Budget for one resolution: cache read, upstream request and cache write
    pub timeout: Duration,
    /// Optional cache port
    pub did_cache: Option<Arc<dyn DidCache>>,
    /// Write tombstones for "not found" instead of clearing the entry
    pub negative_caching: bool,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
}

impl Default for DidResolverOpts {
    fn default() -> Self {
        Self {
            plc_url: DEFAULT_PLC_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            did_cache: None,
            negative_caching: false,
            user_agent: format!("Aurora-Identity/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Atproto-relevant data extracted from a DID document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtprotoData {
    pub did: String,
    pub signing_key: String,
    pub handle: String,
    pub pds: String,
}

/// DID resolver - combines caching with did:web and did:plc resolution
#[derive(Clone)]
pub struct DidResolver {
    http_client: reqwest::Client,
    plc_url: Arc<str>,
    timeout: Duration,
    cache: Option<Arc<dyn DidCache>>,
    not_found: NotFoundPolicy,
}

impl DidResolver {
    /// Create a new DID resolver
    pub fn new(opts: DidResolverOpts) -> ResolverResult<Self> {
        let http_client = build_client(&opts.user_agent)?;

        Ok(Self {
            http_client,
            plc_url: opts.plc_url.into(),
            timeout: opts.timeout,
            cache: opts.did_cache,
            not_found: NotFoundPolicy::from_negative_caching(opts.negative_caching),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a DID to its document, `None` if there is none
    ///
    /// Stale cache entries are returned immediately; their refresh runs as a
    /// detached task whose errors never reach this caller.
    pub async fn resolve(&self, did: &str) -> ResolverResult<Option<DidDocument>> {
        let method = DidMethod::from_did(did)?;
        let deadline = Instant::now() + self.timeout;

        if let Some(cache) = &self.cache {
            if let Some(cached) = self.check_cache(cache.as_ref(), did, deadline).await {
                metrics::record_cache_lookup(cached.freshness.as_str());
                match cached.freshness {
                    Freshness::Fresh => {
                        debug!("DID cache hit: {}", did);
                        return Ok(cached.doc);
                    }
                    Freshness::Stale => {
                        debug!("DID cache stale, revalidating in background: {}", did);
                        let doc = cached.doc.clone();
                        self.spawn_refresh(Arc::clone(cache), cached);
                        return Ok(doc);
                    }
                    Freshness::Expired => debug!("DID cache expired: {}", did),
                }
            } else {
                metrics::record_cache_lookup("miss");
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let doc = self.fetch_from_source(method, did, remaining).await?;
        self.update_cache(did, doc.as_ref(), deadline).await;
        Ok(doc)
    }

    /// Resolve a DID straight from its source, bypassing the cache
    pub async fn resolve_no_cache(&self, did: &str) -> ResolverResult<Option<DidDocument>> {
        let method = DidMethod::from_did(did)?;
        self.fetch_from_source(method, did, self.timeout).await
    }

    async fn fetch_from_source(
        &self,
        method: DidMethod,
        did: &str,
        timeout: Duration,
    ) -> ResolverResult<Option<DidDocument>> {
        let started = Instant::now();

        let result = match method {
            DidMethod::Web => resolve_did_web(&self.http_client, did, timeout).await,
            DidMethod::Plc => resolve_did_plc(&self.http_client, &self.plc_url, did, timeout).await,
        };

        let outcome = match &result {
            Ok(Some(_)) => "found",
            Ok(None) => "not_found",
            Err(e) => e.kind(),
        };
        metrics::record_resolution(method.as_str(), outcome, started.elapsed().as_secs_f64());

        result
    }

    /// Resolve a DID, treating "not found" as an error
    pub async fn ensure_resolve(&self, did: &str) -> ResolverResult<DidDocument> {
        self.resolve(did)
            .await?
            .ok_or_else(|| ResolverError::DidNotFound(did.to_string()))
    }

    /// Resolve a DID and extract its signing key, handle and PDS endpoint
    pub async fn resolve_atproto_data(&self, did: &str) -> ResolverResult<AtprotoData> {
        let doc = self.ensure_resolve(did).await?;

        let signing_key = doc.signing_key().ok_or_else(|| {
            ResolverError::PoorlyFormattedDidDocument(format!("Missing signing key for {}", did))
        })?;
        let handle = doc.handle().ok_or_else(|| {
            ResolverError::PoorlyFormattedDidDocument(format!("Missing handle for {}", did))
        })?;
        let pds = doc.pds_endpoint().ok_or_else(|| {
            ResolverError::PoorlyFormattedDidDocument(format!("Missing PDS endpoint for {}", did))
        })?;

        Ok(AtprotoData {
            did: did.to_string(),
            signing_key,
            handle: handle.to_string(),
            pds: pds.to_string(),
        })
    }

    /// Invalidate cached DID document (force re-fetch)
    pub async fn invalidate(&self, did: &str) -> ResolverResult<()> {
        match &self.cache {
            Some(cache) => cache.clear_entry(did).await,
            None => Ok(()),
        }
    }

    /// Cache read bounded by the resolution deadline; failures count as a miss
    async fn check_cache(
        &self,
        cache: &dyn DidCache,
        did: &str,
        deadline: Instant,
    ) -> Option<CacheResult> {
        match tokio::time::timeout_at(deadline, cache.check_cache(did)).await {
            Ok(Ok(cached)) => cached,
            Ok(Err(e)) => {
                warn!("DID cache lookup failed for {}: {}", did, e);
                None
            }
            Err(_) => {
                warn!("DID cache lookup timed out for {}", did);
                None
            }
        }
    }

    /// Write the resolution outcome back to the cache
    ///
    /// A failed write is logged; the caller still gets the resolved value.
    async fn update_cache(&self, did: &str, doc: Option<&DidDocument>, deadline: Instant) {
        let Some(cache) = &self.cache else {
            return;
        };

        let write = cache.reconcile(did, doc, self.not_found);

        match tokio::time::timeout_at(deadline, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to update DID cache for {}: {}", did, e),
            Err(_) => warn!("DID cache update timed out for {}", did),
        }
    }

    /// Revalidate a stale entry on a detached task
    fn spawn_refresh(&self, cache: Arc<dyn DidCache>, previous: CacheResult) {
        let resolver = self.clone();
        let did = previous.did.clone();
        let not_found = self.not_found;

        tokio::spawn(async move {
            let refetch_did = did.clone();
            let refetch: RefetchFn = Box::new(move || {
                Box::pin(async move { resolver.resolve_no_cache(&refetch_did).await })
            });

            match cache.refresh_cache(&did, refetch, previous, not_found).await {
                Ok(()) => {
                    debug!("Refreshed DID cache entry: {}", did);
                    metrics::record_cache_refresh(true);
                }
                Err(e) => {
                    warn!("Background refresh failed for {}: {}", did, e);
                    metrics::record_cache_refresh(false);
                }
            }
        });
    }
}
