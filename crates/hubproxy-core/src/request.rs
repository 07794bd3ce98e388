//! Request descriptors and planning
//!
//! An [`InboundRequest`] is what the client sent; an [`OutboundRequest`]
//! is what goes upstream. Planning turns one into the other without any
//! I/O, which keeps the rewriting rules testable on their own.

use std::time::Duration;

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};
use tracing::debug;
use url::Url;

use crate::config::UpstreamSettings;
use crate::error::CoreError;
use crate::rewrite::{RequestTarget, rewrite_request_target};
use crate::target::{Target, TargetQuery, resolve_target};

/// Path of the Docker Hub token exchange endpoint
pub const TOKEN_PATH: &str = "/token";

/// Headers copied from the client on every route
const COMMON_PASSTHROUGH: [&str; 4] = ["user-agent", "accept", "accept-language", "accept-encoding"];

/// Extra headers copied on the registry route, for signed (ECR style) requests
const CREDENTIAL_PASSTHROUGH: [&str; 3] = ["authorization", "x-amz-content-sha256", "x-amz-date"];

/// Which header set an outbound request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Generic registry traffic, credentials included
    Registry,
    /// Token exchange, never carries credentials
    Token,
}

impl HeaderProfile {
    fn passthrough(self) -> impl Iterator<Item = &'static str> {
        let credentials: &'static [&'static str] = match self {
            HeaderProfile::Registry => &CREDENTIAL_PASSTHROUGH,
            HeaderProfile::Token => &[],
        };
        COMMON_PASSTHROUGH.into_iter().chain(credentials.iter().copied())
    }
}

/// Request as received from the client
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    target: RequestTarget,
    headers: HeaderMap,
    host: String,
}

impl InboundRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap) -> Self {
        // HTTP/2 clients send :authority instead of Host
        let host = joined_header(&headers, &header::HOST)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        Self {
            method,
            target: RequestTarget::new(uri.path(), uri.query()),
            headers,
            host,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.target.path
    }

    pub fn query(&self) -> Option<&str> {
        self.target.query.as_deref()
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Host the client addressed, port included
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_token_request(&self) -> bool {
        self.path() == TOKEN_PATH
    }

    pub fn target_query(&self) -> TargetQuery {
        TargetQuery::parse(self.query())
    }

    /// Resolve which upstream this request is aimed at
    pub fn resolve_target(&self) -> Target {
        resolve_target(&self.target_query(), &self.host)
    }
}

/// Request to send upstream
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Advisory lifetime for caching the response in the transport
    pub cache_ttl: Option<Duration>,
}

impl OutboundRequest {
    /// Host header value the request was planned with
    pub fn host(&self) -> Option<&str> {
        self.headers.get(header::HOST).and_then(|v| v.to_str().ok())
    }
}

/// Plan a generic registry request
///
/// Resolves the target, applies the implicit namespace fixes and builds
/// the registry header set.
pub fn plan_registry_request(
    inbound: &InboundRequest,
    settings: &UpstreamSettings,
) -> Result<(Target, OutboundRequest), CoreError> {
    let target = inbound.resolve_target();
    // Namespace fixes see the path after `.` and `..` are resolved
    let normalized = upstream_url(settings, target.host(), inbound.target())?;
    let rewritten = rewrite_request_target(&RequestTarget::from_url(&normalized), &target);
    let url = upstream_url(settings, target.host(), &rewritten)?;

    debug!(target_host = %target, url = %url, "Planned registry request");

    let request = OutboundRequest {
        method: inbound.method().clone(),
        url,
        headers: upstream_headers(inbound, target.host(), HeaderProfile::Registry)?,
        cache_ttl: settings.cache_ttl,
    };
    Ok((target, request))
}

/// Plan a token exchange against the Docker auth service
///
/// Only valid when the request resolves to Docker Hub. Path and query are
/// passed through untouched.
pub fn plan_token_request(
    inbound: &InboundRequest,
    settings: &UpstreamSettings,
) -> Result<OutboundRequest, CoreError> {
    let target = inbound.resolve_target();
    if !target.is_docker_hub() {
        return Err(CoreError::InvalidTokenTarget(target.host().to_string()));
    }

    let auth_host = settings.docker_auth_host.as_str();
    let url = upstream_url(settings, auth_host, inbound.target())?;

    debug!(url = %url, "Planned token request");

    Ok(OutboundRequest {
        method: inbound.method().clone(),
        url,
        headers: upstream_headers(inbound, auth_host, HeaderProfile::Token)?,
        cache_ttl: None,
    })
}

fn upstream_url(
    settings: &UpstreamSettings,
    host: &str,
    target: &RequestTarget,
) -> Result<Url, CoreError> {
    let raw = format!("{}://{}{}", settings.scheme, host, target);
    Url::parse(&raw).map_err(|source| CoreError::InvalidUrl { url: raw, source })
}

/// Build the filtered header set for an upstream request
///
/// Pass-through headers default to an empty value when the client did
/// not send them. `Connection` and `Cache-Control` are always forced.
pub fn upstream_headers(
    inbound: &InboundRequest,
    host: &str,
    profile: HeaderProfile,
) -> Result<HeaderMap, CoreError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::HOST,
        HeaderValue::from_str(host).map_err(|_| CoreError::InvalidHeader("host"))?,
    );

    for name in profile.passthrough() {
        let name = HeaderName::from_static(name);
        let value = joined_header(inbound.headers(), &name).unwrap_or(HeaderValue::from_static(""));
        headers.insert(name, value);
    }

    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    Ok(headers)
}

/// All values of a header joined with `, `, or `None` if absent
fn joined_header(headers: &HeaderMap, name: &HeaderName) -> Option<HeaderValue> {
    let mut values = headers.get_all(name).iter();
    let first = values.next()?;

    let mut joined = first.as_bytes().to_vec();
    for value in values {
        joined.extend_from_slice(b", ");
        joined.extend_from_slice(value.as_bytes());
    }
    // Joining valid values with ", " stays valid
    HeaderValue::from_bytes(&joined).ok()
}
