//! Server configuration.
//!
//! Values are layered, later sources winning:
//! built-in defaults, an optional YAML file, `LITESERVE_*` environment
//! variables, then command-line arguments.
//!
//! ```yaml
//! server:
//!   port: 8080
//!   max_workers: 20
//! static_files:
//!   root: ./public
//!   cache_capacity: 64
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;

/// Command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "liteserve")]
#[command(about = "Serve files and directory listings over HTTP/1.0")]
#[command(version)]
pub struct Cli {
    /// Port to listen on (1-65534)
    #[arg(value_parser = parse_port)]
    pub port: Option<u16>,

    /// YAML configuration file
    #[arg(short, long, env = "LITESERVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to serve (defaults to the working directory)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Accepts decimal ports strictly between 0 and 65535.
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u32 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a port number"))?;
    match port {
        1..=65534 => Ok(port as u16),
        _ => Err(format!("port {port} out of range (1-65534)")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sent in the `Server` response header
    pub name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    /// Accepted connections waiting for a worker
    pub queue_capacity: usize,
    /// 0 disables the timeout
    pub read_timeout_ms: u64,
    /// 0 disables the timeout
    pub write_timeout_ms: u64,
    pub max_head_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    /// Maximum number of files held in memory
    pub cache_capacity: usize,
    /// Serve URIs containing `..` segments instead of rejecting them
    pub allow_traversal: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            name: "liteserve".to_string(),
            min_workers: 1,
            max_workers: 20,
            queue_capacity: 10_000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            max_head_bytes: 8 * 1024,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            cache_capacity: 64,
            allow_traversal: false,
        }
    }
}

impl Config {
    /// Loads defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Builds the effective configuration for a process invocation.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = Self::load(cli.config.as_deref())?;
        cfg.apply_env(|key| std::env::var(key).ok());

        if let Some(port) = cli.port {
            cfg.server.port = port;
        }
        if let Some(root) = &cli.root {
            cfg.static_files.root = root.clone();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `LITESERVE_HOST` and `LITESERVE_ROOT` through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("LITESERVE_HOST") {
            self.server.host = host;
        }
        if let Some(root) = lookup("LITESERVE_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !(1..=65534).contains(&self.server.port) {
            return invalid("port must be between 1 and 65534");
        }
        if self.server.min_workers == 0 {
            return invalid("min_workers must be >= 1");
        }
        if self.server.max_workers < self.server.min_workers {
            return invalid("max_workers must be >= min_workers");
        }
        if self.server.queue_capacity == 0 {
            return invalid("queue_capacity must be >= 1");
        }
        if self.static_files.cache_capacity == 0 {
            return invalid("cache_capacity must be >= 1");
        }
        if self.server.max_head_bytes == 0 {
            return invalid("max_head_bytes must be >= 1");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Available parallelism clamped into `[min_workers, max_workers]`.
    pub fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores.clamp(self.server.min_workers, self.server.max_workers.max(self.server.min_workers))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.server.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.server.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
