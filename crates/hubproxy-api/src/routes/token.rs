//! Docker Hub token endpoint
//!
//! Clients follow the rewritten `Www-Authenticate` realm here. The
//! exchange is relayed to the Docker auth service as-is: no credentials
//! are forwarded and the response is not rewritten.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
    routing::any,
};
use hubproxy_core::{CoreError, InboundRequest, TOKEN_PATH, plan_token_request};
use tracing::debug;

use super::{forward, relay};
use crate::error::ApiError;
use crate::state::AppState;

/// ANY /token
async fn token(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let inbound = InboundRequest::new(method, &uri, headers);

    let outbound = plan_token_request(&inbound, &state.settings).map_err(|err| {
        if let CoreError::InvalidTokenTarget(host) = &err {
            debug!("Rejecting token request for {}", host);
            metrics::counter!("hubproxy_token_rejections_total").increment(1);
        }
        err
    })?;

    metrics::counter!("hubproxy_requests_total", "route" => "token", "target" => "docker")
        .increment(1);

    let upstream = forward(&state, outbound, "token").await?;
    Ok(relay(upstream))
}

/// Create token routes
pub fn routes() -> Router<AppState> {
    Router::new().route(TOKEN_PATH, any(token))
}
