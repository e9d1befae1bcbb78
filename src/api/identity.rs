/// Identity API endpoints
/// Implements com.atproto.identity.resolveDid and resolveAtprotoData
use crate::{
    context::AppContext,
    error::{ResolverError, ResolverResult},
    identity::{AtprotoData, DidDocument},
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveDidParams {
    /// DID to resolve (e.g., "did:plc:ewvi7nxzyoun6zhxrhs64oiz")
    pub did: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveDidResponse {
    pub did_doc: DidDocument,
}

fn validate_did_param(did: &str) -> ResolverResult<()> {
    if did.is_empty() {
        return Err(ResolverError::Validation("DID cannot be empty".to_string()));
    }
    if !did.starts_with("did:") {
        return Err(ResolverError::Validation(format!("Invalid DID: {}", did)));
    }
    Ok(())
}

/// com.atproto.identity.resolveDid
///
/// Resolve a DID to its document (cached)
pub async fn resolve_did(
    State(ctx): State<AppContext>,
    Query(params): Query<ResolveDidParams>,
) -> ResolverResult<Json<ResolveDidResponse>> {
    validate_did_param(&params.did)?;

    let did_doc = ctx.resolver.ensure_resolve(&params.did).await?;

    Ok(Json(ResolveDidResponse { did_doc }))
}

/// com.atproto.identity.resolveAtprotoData
///
/// Resolve a DID and return its signing key, handle and PDS endpoint
pub async fn resolve_atproto_data(
    State(ctx): State<AppContext>,
    Query(params): Query<ResolveDidParams>,
) -> ResolverResult<Json<AtprotoData>> {
    validate_did_param(&params.did)?;

    let data = ctx.resolver.resolve_atproto_data(&params.did).await?;

    Ok(Json(data))
}

/// Build identity routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/xrpc/com.atproto.identity.resolveDid", get(resolve_did))
        .route(
            "/xrpc/com.atproto.identity.resolveAtprotoData",
            get(resolve_atproto_data),
        )
}
