//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Token endpoint only serves Docker Hub, request resolved to {0}")]
    InvalidTokenTarget(String),

    #[error("Invalid upstream URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),
}
