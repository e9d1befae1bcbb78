/// Outbound HTTP for DID document fetches
///
/// Redirects are never followed: a 3xx must be observable so resolvers can
/// refuse it rather than let an intermediate host substitute a document.
use crate::error::{ResolverError, ResolverResult};
use reqwest::{header, redirect, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DID_DOC_ACCEPT: &str = "application/did+ld+json,application/json";

/// Largest document body read from an upstream host (64 KiB)
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024;

/// Response of a single document fetch
#[derive(Debug)]
pub enum FetchResponse {
    /// 3xx, not followed
    Redirect(StatusCode),
    /// Any other non-2xx status
    Status(StatusCode),
    /// 2xx with a JSON body
    Body(Value),
}

/// Build the HTTP client used for DID resolution
pub fn build_client(user_agent: &str) -> ResolverResult<Client> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(redirect::Policy::none())
        .build()
        .map_err(|e| ResolverError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// GET a DID document URL, bounded by `timeout`
///
/// The timeout covers connecting, headers and the body read. A 2xx body that
/// isn't JSON, or is larger than `MAX_DOCUMENT_SIZE`, is an upstream failure.
pub async fn fetch_document(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> ResolverResult<FetchResponse> {
    debug!("Fetching DID document from {}", url);

    let request = send_request(client, url, timeout);

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(ResolverError::Timeout(format!(
            "{} did not respond within {}ms",
            url,
            timeout.as_millis()
        ))),
    }
}

async fn send_request(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> ResolverResult<FetchResponse> {
    let mut response = client
        .get(url)
        .header(header::ACCEPT, DID_DOC_ACCEPT)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| map_reqwest_error(url, e))?;

    let status = response.status();
    if status.is_redirection() {
        return Ok(FetchResponse::Redirect(status));
    }
    if !status.is_success() {
        return Ok(FetchResponse::Status(status));
    }

    if response
        .content_length()
        .is_some_and(|len| len > MAX_DOCUMENT_SIZE as u64)
    {
        return Err(document_too_large(url));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| map_reqwest_error(url, e))?
    {
        if body.len() + chunk.len() > MAX_DOCUMENT_SIZE {
            return Err(document_too_large(url));
        }
        body.extend_from_slice(&chunk);
    }

    let raw = serde_json::from_slice(&body)
        .map_err(|e| ResolverError::Http(format!("Invalid JSON from {}: {}", url, e)))?;
    Ok(FetchResponse::Body(raw))
}

fn document_too_large(url: &str) -> ResolverError {
    ResolverError::Http(format!(
        "Document from {} exceeds {} bytes",
        url, MAX_DOCUMENT_SIZE
    ))
}

fn map_reqwest_error(url: &str, e: reqwest::Error) -> ResolverError {
    if e.is_timeout() {
        ResolverError::Timeout(format!("{}: {}", url, e))
    } else {
        ResolverError::Http(format!("Failed to fetch {}: {}", url, e))
    }
}
