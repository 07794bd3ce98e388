//! Upstream registry client

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http::header::{self, HeaderMap};
use http::StatusCode;
use hubproxy_core::OutboundRequest;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::ProxyError;

/// Type alias for a boxed stream of body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

/// Upstream answer with the body left unread
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Something that can execute a planned upstream request
///
/// Each call is a single attempt; retries are not this layer's concern.
///
/// Only the method, URL and headers of the plan are sent. Request bodies
/// are never forwarded, so a `PUT` or `PATCH` reaches the upstream empty
/// and without `Content-Length`.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// Upstream client configuration
#[derive(Clone, Debug, Default)]
pub struct UpstreamClientConfig {
    /// Overall deadline for receiving response headers and body
    pub timeout: Option<Duration>,
    /// Deadline for establishing the connection
    pub connect_timeout: Option<Duration>,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
}

/// reqwest-backed forwarder shared by all requests
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Create a new upstream client
    pub fn new(config: UpstreamClientConfig) -> Result<Self, ProxyError> {
        // Redirects are followed so blob downloads that bounce to object
        // storage are fetched here rather than by the client.
        let mut builder = Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if config.skip_tls_verify {
            warn!("TLS certificate verification is disabled for upstream requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        info!(
            timeout = ?config.timeout,
            connect_timeout = ?config.connect_timeout,
            "Created upstream client"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for UpstreamClient {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let OutboundRequest {
            method,
            url,
            mut headers,
            cache_ttl,
        } = request;

        // The transport derives Host from the URL authority, which is the
        // same value. Leaving it to the transport keeps followed redirects
        // addressed to the right host.
        headers.remove(header::HOST);

        // reqwest has no response cache, the hint is informational only
        if let Some(ttl) = cache_ttl {
            debug!(cache_ttl_secs = ttl.as_secs(), "Cache hint on upstream request");
        }

        debug!("Forwarding {} {}", method, url);

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!("Upstream responded {} for {}", status, response.url());

        let body: ByteStream = Box::pin(response.bytes_stream().map_err(ProxyError::from));

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::HeaderMap as AxumHeaderMap;
    use axum::routing::get;
    use http::{HeaderValue, Method};
    use std::net::SocketAddr;

    async fn spawn_upstream(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn outbound(addr: SocketAddr, path: &str) -> OutboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(&addr.to_string()).unwrap());
        headers.insert(header::USER_AGENT, HeaderValue::from_static("docker/27.0"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(""));
        OutboundRequest {
            method: Method::GET,
            url: format!("http://{addr}{path}").parse().unwrap(),
            headers,
            cache_ttl: Some(Duration::from_secs(3600)),
        }
    }

    async fn collect(body: ByteStream) -> Vec<u8> {
        body.try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .unwrap()
    }

    async fn echo_headers(headers: AxumHeaderMap) -> ([(&'static str, &'static str); 1], String) {
        let mut lines: Vec<String> = headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v.to_str().unwrap_or("?")))
            .collect();
        lines.sort();
        (
            [("www-authenticate", "Bearer realm=\"https://auth.docker.io/token\"")],
            lines.join("\n"),
        )
    }

    #[tokio::test]
    async fn test_forward_relays_status_headers_and_body() {
        let router = Router::new().route("/v2/library/alpine/manifests/latest", get(echo_headers));
        let addr = spawn_upstream(router).await;

        let client = UpstreamClient::new(UpstreamClientConfig::default()).unwrap();
        let response = client
            .forward(outbound(addr, "/v2/library/alpine/manifests/latest"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        // Response headers come back untouched
        assert_eq!(
            response.headers["www-authenticate"],
            "Bearer realm=\"https://auth.docker.io/token\""
        );

        let body = String::from_utf8(collect(response.body).await).unwrap();
        assert!(body.contains(&format!("host: {addr}")));
        assert!(body.contains("user-agent: docker/27.0"));
        assert!(body.contains("authorization: "));
    }

    #[tokio::test]
    async fn test_forward_keeps_method_without_body() {
        let router = Router::new().route(
            "/v2/alpine/blobs/uploads/",
            axum::routing::put(|method: Method, body: axum::body::Bytes| async move {
                format!("{} {}", method, body.len())
            }),
        );
        let addr = spawn_upstream(router).await;

        let mut request = outbound(addr, "/v2/alpine/blobs/uploads/");
        request.method = Method::PUT;

        let client = UpstreamClient::new(UpstreamClientConfig::default()).unwrap();
        let response = client.forward(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        let body = String::from_utf8(collect(response.body).await).unwrap();
        assert_eq!(body, "PUT 0");
    }

    #[tokio::test]
    async fn test_forward_propagates_error_status() {
        let router = Router::new();
        let addr = spawn_upstream(router).await;

        let client = UpstreamClient::new(UpstreamClientConfig::default()).unwrap();
        let response = client.forward(outbound(addr, "/v2/missing")).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(UpstreamClientConfig::default()).unwrap();
        let err = client.forward(outbound(addr, "/v2/")).await.unwrap_err();

        assert!(matches!(err, ProxyError::Http(_)));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn test_forward_timeout() {
        let router = Router::new().route(
            "/v2/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = spawn_upstream(router).await;

        let client = UpstreamClient::new(UpstreamClientConfig {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        })
        .unwrap();
        let err = client.forward(outbound(addr, "/v2/")).await.unwrap_err();

        assert!(err.is_timeout());
    }
}
