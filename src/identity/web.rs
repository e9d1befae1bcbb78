/// did:web resolution
///
/// did:web:example.com -> https://example.com/.well-known/did.json
/// Path-bearing DIDs (did:web:example.com:user:alice) are not supported.
use crate::{
    error::{ResolverError, ResolverResult},
    identity::{
        did::DID_WEB_PREFIX,
        document::{validate_did_doc, DidDocument},
        fetch::{fetch_document, FetchResponse},
    },
};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Build the well-known document URL for a did:web
///
/// Fails before any network access for malformed or path-bearing DIDs.
pub fn did_web_url(did: &str) -> ResolverResult<Url> {
    let id = did
        .strip_prefix(DID_WEB_PREFIX)
        .ok_or_else(|| ResolverError::UnsupportedMethod(did.to_string()))?;

    if id.is_empty() {
        return Err(ResolverError::UnsupportedDidFormat(format!(
            "Invalid did:web format: {}",
            did
        )));
    }
    if id.contains(':') {
        return Err(ResolverError::UnsupportedDidFormat(format!(
            "Unsupported did:web with path: {}",
            did
        )));
    }

    let domain = urlencoding::decode(id).map_err(|e| {
        ResolverError::UnsupportedDidFormat(format!("Invalid did:web encoding {}: {}", did, e))
    })?;

    let mut url = Url::parse(&format!("https://{}/.well-known/did.json", domain)).map_err(|e| {
        ResolverError::UnsupportedDidFormat(format!("Invalid did:web domain {}: {}", did, e))
    })?;

    // Plain HTTP for local development
    if url.host_str() == Some("localhost") {
        url.set_scheme("http").map_err(|_| {
            ResolverError::Internal(format!("Failed to downgrade scheme for {}", url))
        })?;
    }

    Ok(url)
}

/// Resolve a did:web document
///
/// A personal web host that doesn't serve a document (any non-2xx,
/// including refused redirects) counts as "not found", never as an error.
pub async fn resolve_did_web(
    client: &Client,
    did: &str,
    timeout: Duration,
) -> ResolverResult<Option<DidDocument>> {
    let url = did_web_url(did)?;

    match fetch_document(client, url.as_str(), timeout).await? {
        FetchResponse::Redirect(status) => {
            debug!("Refusing redirect ({}) for {}", status, did);
            Ok(None)
        }
        FetchResponse::Status(status) => {
            debug!("did:web host returned {} for {}", status, did);
            Ok(None)
        }
        FetchResponse::Body(raw) => Ok(validate_did_doc(did, raw)),
    }
}
