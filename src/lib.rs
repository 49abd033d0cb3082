//! liteserve - a small concurrent HTTP/1.0 static file server
//!
//! Core library: request parsing, response building, the content cache,
//! and the worker pool that ties them to accepted connections.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
