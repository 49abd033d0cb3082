//! Decides what to send back for a request.
//!
//! | Request                    | Status | Body                      |
//! |----------------------------|--------|---------------------------|
//! | HEAD anything              | 200    | none                      |
//! | GET directory              | 200    | HTML index                |
//! | GET file                   | 200    | file bytes (cached)       |
//! | GET missing path           | 404    | `404 Not Found`           |
//! | GET with I/O failure       | 400    | `400 Bad Request`         |
//! | any other method           | 400    | `400 Bad Request`         |

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::ContentCache;
use crate::config::Config;
use crate::http::listing;
use crate::http::mime;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

#[derive(Debug)]
pub struct Responder {
    root: PathBuf,
    server_name: String,
    allow_traversal: bool,
    cache: Arc<ContentCache>,
}

impl Responder {
    pub fn new(root: impl Into<PathBuf>, server_name: impl Into<String>, cache: Arc<ContentCache>) -> Self {
        Self {
            root: root.into(),
            server_name: server_name.into(),
            allow_traversal: false,
            cache,
        }
    }

    pub fn from_config(cfg: &Config, cache: Arc<ContentCache>) -> Self {
        Self::new(&cfg.static_files.root, &cfg.server.name, cache)
            .allow_traversal(cfg.static_files.allow_traversal)
    }

    pub fn allow_traversal(mut self, allow: bool) -> Self {
        self.allow_traversal = allow;
        self
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub async fn respond(&self, req: &Request) -> Response {
        match req.method {
            Method::Head => self.headers(StatusCode::Ok).build(),
            Method::Get => match self.get(req).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(uri = %req.uri, error = %format!("{err:#}"), "GET failed");
                    self.error_page(StatusCode::BadRequest)
                }
            },
            Method::Other => self.error_page(StatusCode::BadRequest),
        }
    }

    /// Maps a URI path onto the served tree, or `None` if it climbs out of
    /// the root while traversal is disabled.
    pub fn resolve(&self, uri_path: &str) -> Option<PathBuf> {
        let relative = uri_path.trim_start_matches('/');
        if !self.allow_traversal && relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }

    async fn get(&self, req: &Request) -> anyhow::Result<Response> {
        let uri_path = req.path();
        let Some(path) = self.resolve(uri_path) else {
            bail!("path escapes the served root");
        };

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(err) if is_missing(&err) => {
                debug!(uri = %req.uri, "file not found");
                return Ok(self.error_page(StatusCode::NotFound));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("stat {}", path.display()));
            }
        };

        if meta.is_dir() {
            let html = listing::render_directory(uri_path, &path)
                .await
                .with_context(|| format!("list {}", path.display()))?;
            return Ok(self
                .headers(StatusCode::Ok)
                .header("Content-Type", "text/html")
                .body(html)
                .build());
        }

        let bytes = self.read_through(uri_path, path).await?;
        Ok(self
            .headers(StatusCode::Ok)
            .header_opt("Content-Type", mime::content_type_for(uri_path))
            .body(bytes)
            .build())
    }

    async fn read_through(&self, key: &str, path: PathBuf) -> anyhow::Result<Bytes> {
        let bytes = self
            .cache
            .get_or_fetch(key, move || async move { read_file(&path).await })
            .await?;
        Ok(bytes)
    }

    fn headers(&self, status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
            .header("Connection", "close")
            .header("Server", self.server_name.as_str())
    }

    /// Page whose body is the status line text, e.g. `404 Not Found`. No
    /// content type is declared.
    fn error_page(&self, status: StatusCode) -> Response {
        self.headers(status).body(status.to_string()).build()
    }
}

async fn read_file(path: &Path) -> io::Result<Bytes> {
    tokio::fs::read(path).await.map(Bytes::from)
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
