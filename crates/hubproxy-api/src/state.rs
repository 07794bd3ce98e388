//! Application state

use hubproxy_core::UpstreamSettings;
use hubproxy_proxy::Forwarder;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Prometheus handle used to render the metrics endpoint
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
///
/// Everything in here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<dyn Forwarder>,
    pub settings: Arc<UpstreamSettings>,
}

impl AppState {
    pub fn new(forwarder: Arc<dyn Forwarder>, settings: UpstreamSettings) -> Self {
        Self {
            forwarder,
            settings: Arc::new(settings),
        }
    }
}
