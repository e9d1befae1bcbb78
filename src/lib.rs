/// Aurora Identity - DID resolution for ATProto services
///
/// Resolves did:web and did:plc identifiers to DID documents behind a
/// stale-while-revalidate cache, refusing redirects from upstream hosts.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod metrics;
pub mod server;

pub use context::AppContext;
pub use error::{ResolverError, ResolverResult};
pub use identity::{DidCache, DidDocument, DidResolver, DidResolverOpts};
