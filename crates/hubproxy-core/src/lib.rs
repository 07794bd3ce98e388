//! hubproxy core rewriting engine
//!
//! Pure request/response rewriting for the registry proxy: which upstream
//! a request targets, how its path and query are normalized, which
//! headers go upstream, and how auth challenges are pointed back at the
//! proxy. Nothing in this crate performs I/O.

pub mod config;
pub mod error;
pub mod registry;
pub mod request;
pub mod response;
pub mod rewrite;
pub mod target;

pub use config::{Scheme, UpstreamSettings};
pub use error::CoreError;
pub use registry::{Registry, resolve_alias};
pub use request::{
    HeaderProfile, InboundRequest, OutboundRequest, TOKEN_PATH, plan_registry_request,
    plan_token_request,
};
pub use response::rewrite_challenge;
pub use rewrite::{RequestTarget, fix_path_namespace, fix_query_namespace, rewrite_request_target};
pub use target::{Target, TargetQuery, resolve_target};
