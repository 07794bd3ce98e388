//! API routes

mod health;
pub mod metrics;
mod registry;
mod token;

use axum::{Router, body::Body, response::Response};
use hubproxy_core::OutboundRequest;
use hubproxy_proxy::UpstreamResponse;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Docker Hub token exchange
        .merge(token::routes())
        // Everything else is registry traffic
        .fallback(registry::proxy)
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}

/// Send a planned request upstream, counting failures
async fn forward(
    state: &AppState,
    outbound: OutboundRequest,
    route: &'static str,
) -> Result<UpstreamResponse, ApiError> {
    let url = outbound.url.clone();
    state.forwarder.forward(outbound).await.map_err(|err| {
        warn!("Upstream request to {} failed: {}", url, err);
        ::metrics::counter!("hubproxy_upstream_errors_total", "route" => route).increment(1);
        ApiError::from(err)
    })
}

/// Turn an upstream response into ours, body still streaming
fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from_stream(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = upstream.headers;
    response
}
