//! HTTP/1.0 protocol handling.
//!
//! Every connection carries exactly one request. There is no keep-alive,
//! no request body, and the response always ends with the connection
//! being closed.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine driving one exchange
//! - **`parser`**: turns raw head bytes into a [`request::Request`]
//! - **`request`**: request representation and header lookup
//! - **`responder`**: maps a request onto the served directory tree
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes and writes responses to the client
//! - **`mime`**: content types from the URI suffix
//! - **`listing`**: HTML index pages for directories
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read the head up to the blank line
//!        └──────┬──────┘
//!               │ Request (or malformed stand-in)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Responder picks status, headers, body
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use liteserve::cache::ContentCache;
//! use liteserve::http::connection::{Connection, ConnectionLimits};
//! use liteserve::http::responder::Responder;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let responder = Arc::new(Responder::new(".", "liteserve", Arc::new(ContentCache::new(64))));
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let responder = Arc::clone(&responder);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, addr.to_string(), ConnectionLimits::default());
//!             if let Err(e) = conn.run(&responder).await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod listing;
pub mod mime;
pub mod parser;
pub mod request;
pub mod responder;
pub mod response;
pub mod writer;
