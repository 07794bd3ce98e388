//! hubproxy upstream forwarder
//!
//! Sends planned requests to upstream registries and hands back the
//! response with its body still streaming.

pub mod client;
pub mod error;

pub use client::{ByteStream, Forwarder, UpstreamClient, UpstreamClientConfig, UpstreamResponse};
pub use error::ProxyError;
