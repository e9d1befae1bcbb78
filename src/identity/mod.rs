/// Identity Resolution System
///
/// Resolves did:web and did:plc identifiers to DID documents, with a
/// pluggable stale-while-revalidate cache in front of the network.

pub mod cache;
pub mod did;
pub mod document;
pub mod fetch;
pub mod memory_cache;
pub mod plc;
pub mod resolver;
pub mod sqlite_cache;
pub mod web;

pub use cache::{CacheResult, DidCache, Freshness, NotFoundPolicy, RefetchFn};
pub use did::DidMethod;
pub use document::{validate_did_doc, DidDocument, Service, VerificationMethod};
pub use memory_cache::MemoryDidCache;
pub use resolver::{AtprotoData, DidResolver, DidResolverOpts};
pub use sqlite_cache::SqliteDidCache;
