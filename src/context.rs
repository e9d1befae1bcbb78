/// Application context and dependency injection
use crate::{
    config::{CacheBackend, ServerConfig},
    error::ResolverResult,
    identity::{DidCache, DidResolver, DidResolverOpts, MemoryDidCache, SqliteDidCache},
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub resolver: DidResolver,
    /// Cache behind the resolver, swept by the cleanup job
    pub did_cache: Option<Arc<dyn DidCache>>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ResolverResult<Self> {
        // Validate configuration
        config.validate()?;

        let stale_ttl = config.cache.stale_ttl();
        let max_ttl = config.cache.max_ttl();

        let did_cache: Option<Arc<dyn DidCache>> = match &config.cache.backend {
            CacheBackend::None => None,
            CacheBackend::Memory => {
                info!("Using in-memory DID cache");
                let cache: Arc<dyn DidCache> =
                    Arc::new(MemoryDidCache::new().with_ttls(stale_ttl, max_ttl));
                Some(cache)
            }
            CacheBackend::Sqlite { location } => {
                info!("Opening DID cache at {}", location.display());
                let cache = SqliteDidCache::connect(location)
                    .await?
                    .with_ttls(stale_ttl, max_ttl);
                let cache: Arc<dyn DidCache> = Arc::new(cache);
                Some(cache)
            }
        };

        let resolver = DidResolver::new(DidResolverOpts {
            plc_url: config.identity.did_plc_url.clone(),
            timeout: config.identity.timeout(),
            did_cache: did_cache.clone(),
            negative_caching: config.identity.negative_caching,
            user_agent: config.identity.user_agent.clone(),
        })?;

        Ok(Self {
            config: Arc::new(config),
            resolver,
            did_cache,
        })
    }

    /// Build a context around an existing resolver
    pub fn with_resolver(config: ServerConfig, resolver: DidResolver) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            did_cache: None,
        }
    }
}
