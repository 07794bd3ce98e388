//! Target resolution
//!
//! Decides which upstream host a request is aimed at, from the `ns` and
//! `hubhost` query parameters and the request's own host.

use std::fmt;

use crate::registry::Registry;

/// `ns` value that selects Docker Hub
const DOCKER_IO: &str = "docker.io";

/// Upstream selected for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// One of the registries in the directory
    Known(Registry),
    /// Arbitrary upstream host given verbatim through `ns`
    Direct(String),
}

impl Target {
    pub fn host(&self) -> &str {
        match self {
            Target::Known(registry) => registry.host(),
            Target::Direct(host) => host,
        }
    }

    pub fn is_docker_hub(&self) -> bool {
        matches!(self, Target::Known(Registry::Docker))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}

/// Query parameters that influence target resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetQuery {
    pub ns: Option<String>,
    pub hubhost: Option<String>,
}

impl TargetQuery {
    /// Extract `ns` and `hubhost` from a raw query string
    ///
    /// Values are form-decoded. The first occurrence of each key wins and
    /// empty values count as absent.
    pub fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return parsed;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "ns" => &mut parsed.ns,
                "hubhost" => &mut parsed.hubhost,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        parsed.ns = parsed.ns.filter(|v| !v.is_empty());
        parsed.hubhost = parsed.hubhost.filter(|v| !v.is_empty());
        parsed
    }
}

/// Resolve the upstream for a request
///
/// 1. `ns=docker.io` selects Docker Hub, an `ns` naming a directory alias
///    or host selects that registry, any other `ns` is used verbatim.
/// 2. Without `ns`, the first DNS label of `hubhost` (or of the request
///    host, lowercased) is looked up as an alias.
/// 3. Anything unresolved falls back to Docker Hub.
pub fn resolve_target(query: &TargetQuery, request_host: &str) -> Target {
    if let Some(ns) = query.ns.as_deref() {
        if ns == DOCKER_IO {
            return Target::Known(Registry::Docker);
        }
        return match Registry::from_alias(ns).or_else(|| Registry::from_host(ns)) {
            Some(registry) => Target::Known(registry),
            None => Target::Direct(ns.to_string()),
        };
    }

    let label = match query.hubhost.as_deref() {
        Some(hubhost) => first_label(hubhost).to_string(),
        // Host names are case-insensitive, query values are not
        None => first_label(strip_port(request_host)).to_ascii_lowercase(),
    };

    Target::Known(Registry::from_alias(&label).unwrap_or(Registry::Docker))
}

fn first_label(host: &str) -> &str {
    host.split('.').next().unwrap_or_default()
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their colons
    if host.starts_with('[') {
        return host.find(']').map(|end| &host[..=end]).unwrap_or(host);
    }
    host.split_once(':').map(|(h, _)| h).unwrap_or(host)
}
