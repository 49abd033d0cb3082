use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ParseError;
use crate::http::parser::{find_head_end, parse_request_bytes};
use crate::http::request::Request;
use crate::http::responder::Responder;
use crate::http::writer::ResponseWriter;

/// Per-connection I/O bounds.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub max_head_bytes: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: None,
            max_head_bytes: 8 * 1024,
        }
    }
}

impl ConnectionLimits {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
            max_head_bytes: cfg.server.max_head_bytes,
        }
    }
}

pub struct Connection<S> {
    stream: S,
    peer: String,
    buffer: Vec<u8>,
    state: ConnectionState,
    limits: ConnectionLimits,
}

/// One request per connection:
/// `Reading → Processing → Writing → Closed`.
pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>, limits: ConnectionLimits) -> Self {
        Self {
            stream,
            peer: peer.into(),
            buffer: Vec::with_capacity(1024),
            state: ConnectionState::Reading,
            limits,
        }
    }

    /// Serves exactly one request, then shuts the stream down.
    ///
    /// A request that cannot be read or parsed is still answered (with 400).
    /// Errors returned here are failures to deliver the response.
    pub async fn run(&mut self, responder: &Responder) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let request = match self.read_request().await {
                        Ok(request) => request,
                        Err(e) => {
                            warn!(peer = %self.peer, error = %format!("{e:#}"), "unreadable request");
                            Request::malformed()
                        }
                    };
                    self.state = ConnectionState::Processing(request);
                }

                ConnectionState::Processing(req) => {
                    let response = responder.respond(&req).await;
                    info!(
                        peer = %self.peer,
                        method = req.method.as_str(),
                        uri = %req.uri,
                        version = %req.version,
                        status = response.status.as_u16(),
                        "request served"
                    );
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    let limit = self.limits.write_timeout;
                    with_deadline(limit, writer.write_to_stream(&mut self.stream))
                        .await
                        .context("writing response")??;
                    debug!(peer = %self.peer, bytes = writer.len(), "response written");

                    if let Err(e) = self.stream.shutdown().await {
                        debug!(peer = %self.peer, error = %e, "shutdown after response failed");
                    }
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Reads until the blank line ending the head, or end of stream, and
    /// parses what arrived.
    pub async fn read_request(&mut self) -> anyhow::Result<Request> {
        let head_len = loop {
            let max = self.limits.max_head_bytes;
            if let Some(end) = find_head_end(&self.buffer) {
                if end > max {
                    return Err(ParseError::TooLarge(max).into());
                }
                break end;
            }
            if self.buffer.len() > max {
                return Err(ParseError::TooLarge(max).into());
            }

            let mut temp = [0u8; 1024];
            let n = with_deadline(self.limits.read_timeout, self.stream.read(&mut temp))
                .await
                .context("reading request head")??;

            if n == 0 {
                // Client finished sending; parse whatever arrived.
                break self.buffer.len();
            }

            self.buffer.extend_from_slice(&temp[..n]);
        };

        let request = parse_request_bytes(&self.buffer[..head_len])?;
        self.buffer.drain(..head_len);
        Ok(request)
    }
}

/// Runs `fut`, failing with `TimedOut` after `limit` if one is set.
async fn with_deadline<F, T>(limit: Option<Duration>, fut: F) -> std::io::Result<T>
where
    F: Future<Output = T>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed")),
        None => Ok(fut.await),
    }
}
