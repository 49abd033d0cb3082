use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cache::ContentCache;
use crate::config::Config;
use crate::error::ServerError;
use crate::http::connection::{Connection, ConnectionLimits};
use crate::http::responder::Responder;
use crate::server::pool::{ConnectionSlot, WorkerPool};

/// Binds, builds the pool, and accepts until the process is stopped.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = bind(cfg).await?;

    let cache = Arc::new(ContentCache::new(cfg.static_files.cache_capacity));
    let responder = Arc::new(Responder::from_config(cfg, cache));
    debug!(?responder, "responder ready");
    let pool = connection_pool(cfg, responder);

    info!(
        addr = %cfg.listen_addr(),
        root = %cfg.static_files.root.display(),
        workers = pool.worker_count(),
        queue = cfg.server.queue_capacity,
        "Listening"
    );

    serve(listener, &pool).await
}

pub async fn bind(cfg: &Config) -> Result<TcpListener, ServerError> {
    let port = cfg.server.port;
    if !(1..=65534).contains(&port) {
        return Err(ServerError::InvalidPort(u32::from(port)));
    }

    let addr = cfg.listen_addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// A pool whose workers each serve one connection with `responder`.
pub fn connection_pool(cfg: &Config, responder: Arc<Responder>) -> WorkerPool<ConnectionSlot> {
    let limits = ConnectionLimits::from_config(cfg);

    WorkerPool::new(cfg.worker_count(), cfg.server.queue_capacity, move |slot: ConnectionSlot| {
        let responder = Arc::clone(&responder);
        async move {
            let mut conn = Connection::new(slot.stream, slot.peer.to_string(), limits);
            conn.run(&responder)
                .await
                .with_context(|| format!("serving {}", slot.peer))
        }
    })
}

/// Accept loop. Returns only if the pool has been shut down.
pub async fn serve(listener: TcpListener, pool: &WorkerPool<ConnectionSlot>) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        debug!(peer = %peer, queued = pool.queued(), "Accepted connection");

        pool.submit(ConnectionSlot { stream, peer }).await?;
    }
}
