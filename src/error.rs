//! Error types shared across the server.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Failures while turning request-head text into a [`Request`](crate::http::request::Request).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No request line at all.
    #[error("empty request")]
    Empty,
    /// The request line could not be split into method and URI.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    /// The head was not valid UTF-8.
    #[error("request head is not valid UTF-8")]
    Encoding,
    /// The head grew past the configured limit before a blank line arrived.
    #[error("request head exceeds {0} bytes")]
    TooLarge(usize),
}

/// Failures surfaced by [`ContentCache`](crate::cache::ContentCache).
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Reading the underlying file failed; nothing was cached.
    #[error("failed to read {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: Arc<io::Error>,
    },
}

impl CacheError {
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            CacheError::Fetch { source, .. } => source.kind(),
        }
    }
}

/// Failures of the accept loop and worker pool.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid port {0}: expected a value between 1 and 65534")]
    InvalidPort(u32),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("worker pool is shut down")]
    PoolClosed,
}

/// Failures while loading or validating [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
