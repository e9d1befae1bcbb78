/// Background jobs for the identity service
use crate::{identity::DidCache, metrics};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

/// Job scheduler for background tasks
pub struct JobScheduler {
    cache: Arc<dyn DidCache>,
    cleanup_interval: Duration,
}

impl JobScheduler {
    pub fn new(cache: Arc<dyn DidCache>, cleanup_interval: Duration) -> Self {
        Self {
            cache,
            cleanup_interval,
        }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::identity_cache_cleanup_job(Arc::clone(&self)));
    }

    /// Delete expired DID cache entries
    async fn identity_cache_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(scheduler.cleanup_interval);

        loop {
            interval.tick().await;
            scheduler.run_cleanup().await;
        }
    }

    async fn run_cleanup(&self) {
        match self.cache.cleanup_expired().await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleaned up {} expired DID cache entries", count);
                }
            }
            Err(e) => error!("Failed to cleanup identity cache: {}", e),
        }

        match self.cache.count().await {
            Ok(size) => metrics::DID_CACHE_SIZE.set(size),
            Err(e) => error!("Failed to count identity cache entries: {}", e),
        }
    }
}
