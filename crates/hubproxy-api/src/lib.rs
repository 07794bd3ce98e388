//! hubproxy HTTP API
//!
//! Axum routes for the registry proxy: the Docker Hub token endpoint,
//! the catch-all registry route, and the proxy's own health and metrics
//! endpoints under `/-/`.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
