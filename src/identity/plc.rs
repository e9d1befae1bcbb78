/// did:plc resolution against a PLC directory
use crate::{
    error::{ResolverError, ResolverResult},
    identity::{
        document::{validate_did_doc, DidDocument},
        fetch::{fetch_document, FetchResponse},
    },
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PLC_URL: &str = "https://plc.directory";

/// Directory URL for a DID: `<plc_url>/<percent-encoded did>`
pub fn did_plc_url(plc_url: &str, did: &str) -> String {
    format!(
        "{}/{}",
        plc_url.trim_end_matches('/'),
        urlencoding::encode(did)
    )
}

/// Resolve a did:plc document
///
/// Unlike did:web, the directory is expected to be reachable: only a 404
/// means "not found", every other error status is surfaced.
pub async fn resolve_did_plc(
    client: &Client,
    plc_url: &str,
    did: &str,
    timeout: Duration,
) -> ResolverResult<Option<DidDocument>> {
    let url = did_plc_url(plc_url, did);

    match fetch_document(client, &url, timeout).await? {
        FetchResponse::Redirect(status) => {
            debug!("Refusing redirect ({}) from PLC directory for {}", status, did);
            Ok(None)
        }
        FetchResponse::Status(StatusCode::NOT_FOUND) => Ok(None),
        FetchResponse::Status(status) => {
            warn!("PLC directory returned {} for {}", status, did);
            Err(ResolverError::DirectoryError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            })
        }
        FetchResponse::Body(raw) => Ok(validate_did_doc(did, raw)),
    }
}
