//! Configuration loading

use anyhow::{Context, Result};
use hubproxy_core::config::{DEFAULT_CACHE_TTL, DEFAULT_DOCKER_AUTH_HOST};
use hubproxy_core::{Scheme, UpstreamSettings};
use hubproxy_proxy::UpstreamClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Upstream registry access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Scheme for upstream URLs; `http` is only useful against local registries
    #[serde(default)]
    pub scheme: Scheme,
    /// Host the `/token` route forwards to
    #[serde(default = "default_docker_auth_host")]
    pub docker_auth_host: String,
    /// Cache hint on registry requests, 0 disables it
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Overall upstream request timeout; unset means no deadline
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            docker_auth_host: default_docker_auth_host(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_secs: None,
            connect_timeout_secs: None,
            skip_tls_verify: false,
        }
    }
}

impl UpstreamConfig {
    /// Settings for the request planners
    pub fn settings(&self) -> UpstreamSettings {
        UpstreamSettings {
            scheme: self.scheme,
            docker_auth_host: self.docker_auth_host.clone(),
            cache_ttl: (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs)),
        }
    }

    /// Settings for the HTTP client
    pub fn client_config(&self) -> UpstreamClientConfig {
        UpstreamClientConfig {
            timeout: self.timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            skip_tls_verify: self.skip_tls_verify,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Prometheus metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_docker_auth_host() -> String {
    DEFAULT_DOCKER_AUTH_HOST.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject values the proxy cannot run with
    pub fn validate(&self) -> Result<()> {
        let upstream = &self.upstream;

        if upstream.docker_auth_host.trim().is_empty() {
            anyhow::bail!("upstream.docker_auth_host must not be empty");
        }
        if upstream.docker_auth_host.contains('/') {
            anyhow::bail!(
                "upstream.docker_auth_host must be a host, got '{}'",
                upstream.docker_auth_host
            );
        }
        if upstream.timeout_secs == Some(0) {
            anyhow::bail!("upstream.timeout_secs must be greater than zero");
        }
        if upstream.connect_timeout_secs == Some(0) {
            anyhow::bail!("upstream.connect_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
