//! Registry directory
//!
//! The fixed set of upstream registries the proxy knows by alias. The
//! alias is what a client puts in the first DNS label of the proxy host
//! (`gcr.proxy.example.com`) or in the `ns` query parameter.

use std::fmt;

/// Upstream registry known by alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Registry {
    Docker,
    Gcr,
    Ghcr,
    K8s,
    Lscr,
    Nvcr,
    Quay,
}

impl Registry {
    /// Every known registry, in alias order
    pub const ALL: [Registry; 7] = [
        Registry::Docker,
        Registry::Gcr,
        Registry::Ghcr,
        Registry::K8s,
        Registry::Lscr,
        Registry::Nvcr,
        Registry::Quay,
    ];

    /// Look up a registry by its lowercase alias
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "docker" => Some(Registry::Docker),
            "gcr" => Some(Registry::Gcr),
            "ghcr" => Some(Registry::Ghcr),
            "k8s" => Some(Registry::K8s),
            "lscr" => Some(Registry::Lscr),
            "nvcr" => Some(Registry::Nvcr),
            "quay" => Some(Registry::Quay),
            _ => None,
        }
    }

    /// Look up a registry by its upstream hostname
    pub fn from_host(host: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.host() == host)
    }

    pub fn alias(self) -> &'static str {
        match self {
            Registry::Docker => "docker",
            Registry::Gcr => "gcr",
            Registry::Ghcr => "ghcr",
            Registry::K8s => "k8s",
            Registry::Lscr => "lscr",
            Registry::Nvcr => "nvcr",
            Registry::Quay => "quay",
        }
    }

    /// Upstream hostname serving the registry API
    ///
    /// `registry-1.docker.io` doubles as the Docker Hub sentinel that
    /// gates the token endpoint.
    pub fn host(self) -> &'static str {
        match self {
            Registry::Docker => "registry-1.docker.io",
            Registry::Gcr => "gcr.io",
            Registry::Ghcr => "ghcr.io",
            Registry::K8s => "registry.k8s.io",
            Registry::Lscr => "lscr.io",
            Registry::Nvcr => "nvcr.io",
            Registry::Quay => "quay.io",
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Resolve an alias to its upstream hostname
///
/// Returns `None` for unknown aliases; the caller picks the fallback.
pub fn resolve_alias(alias: &str) -> Option<&'static str> {
    Registry::from_alias(alias).map(Registry::host)
}
