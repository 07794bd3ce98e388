//! Catch-all registry proxy
//!
//! Every request that is not the token endpoint or one of the proxy's
//! own `/-/` endpoints lands here, whatever its method or path.

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use hubproxy_core::{InboundRequest, Target, plan_registry_request, rewrite_challenge};

use super::{forward, relay};
use crate::error::ApiError;
use crate::state::AppState;

/// Metrics label for a target; direct hosts are collapsed to bound cardinality
fn target_label(target: &Target) -> &'static str {
    match target {
        Target::Known(registry) => registry.alias(),
        Target::Direct(_) => "direct",
    }
}

/// ANY /*
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let inbound = InboundRequest::new(method, &uri, headers);
    let (target, outbound) = plan_registry_request(&inbound, &state.settings)?;

    metrics::counter!(
        "hubproxy_requests_total",
        "route" => "registry",
        "target" => target_label(&target)
    )
    .increment(1);

    let mut upstream = forward(&state, outbound, "registry").await?;
    rewrite_challenge(
        &mut upstream.headers,
        &state.settings.auth_origin(),
        inbound.host(),
    );

    Ok(relay(upstream))
}
