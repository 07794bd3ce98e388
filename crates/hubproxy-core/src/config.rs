//! Upstream settings shared by the rewriting engine
//!
//! Loaded once at startup by the binary and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Docker Hub token service
pub const DEFAULT_DOCKER_AUTH_HOST: &str = "auth.docker.io";

/// Cache hint attached to registry requests
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// URL scheme used to reach upstreams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings the request planners need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// Scheme for every upstream URL, registry and auth alike
    pub scheme: Scheme,
    /// Host the token endpoint forwards to
    pub docker_auth_host: String,
    /// Advisory cache lifetime for registry responses
    pub cache_ttl: Option<Duration>,
}

impl UpstreamSettings {
    /// Origin of the Docker auth service, as it appears in challenges
    pub fn auth_origin(&self) -> String {
        format!("{}://{}", self.scheme, self.docker_auth_host)
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            docker_auth_host: DEFAULT_DOCKER_AUTH_HOST.to_string(),
            cache_ttl: Some(DEFAULT_CACHE_TTL),
        }
    }
}
