//! API error types

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use hubproxy_core::CoreError;
use hubproxy_proxy::ProxyError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Registry clients expect this exact plain-text answer
            ApiError::Core(CoreError::InvalidTokenTarget(_)) => {
                return (
                    StatusCode::BAD_REQUEST,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    "Invalid request",
                )
                    .into_response();
            }
            ApiError::Core(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string()),
            ApiError::Proxy(e) if e.is_timeout() => {
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", e.to_string())
            }
            ApiError::Proxy(e) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", e.to_string()),
        };

        // OCI Distribution error format
        let body = axum::Json(json!({
            "errors": [{
                "code": code,
                "message": message,
                "detail": null
            }]
        }));

        (status, body).into_response()
    }
}
