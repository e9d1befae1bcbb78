/// Aurora Identity - DID resolution service
///
/// Serves com.atproto.identity.resolveDid backed by a cached did:web and
/// did:plc resolver.

use aurora_identity::{config::ServerConfig, jobs::JobScheduler, server, AppContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;
    let cleanup_interval = Duration::from_secs(config.cache.cleanup_interval);

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Aurora Identity v{}", env!("CARGO_PKG_VERSION"));

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start background jobs
    if let Some(cache) = ctx.did_cache.clone() {
        let scheduler = Arc::new(JobScheduler::new(cache, cleanup_interval));
        scheduler.start();
    }

    // Start server
    server::serve(ctx).await?;

    Ok(())
}
