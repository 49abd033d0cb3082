//! Fixed-size worker pool fed by a bounded FIFO queue.
//!
//! The acceptor pushes jobs with [`WorkerPool::submit`], which waits while
//! the queue is full. `workers` tasks take jobs one at a time, in arrival
//! order, and run the handler on each. A handler that fails or panics is
//! logged; the worker then goes back to the queue.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ServerError;

/// An accepted connection waiting for a worker.
#[derive(Debug)]
pub struct ConnectionSlot {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

impl fmt::Display for ConnectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.peer)
    }
}

pub struct WorkerPool<J> {
    tx: Option<mpsc::Sender<J>>,
    workers: Vec<JoinHandle<()>>,
}

impl<J> WorkerPool<J>
where
    J: fmt::Display + Send + 'static,
{
    /// Spawns `workers` tasks (at least one) draining a queue that holds up
    /// to `queue_capacity` jobs (at least one).
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<H, Fut>(workers: usize, queue_capacity: usize, handler: H) -> Self
    where
        H: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handler = Arc::new(handler);

        let workers = (0..workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                tokio::spawn(work(id, rx, handler))
            })
            .collect();

        Self {
            tx: Some(tx),
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs accepted but not yet taken by a worker.
    pub fn queued(&self) -> usize {
        self.tx
            .as_ref()
            .map_or(0, |tx| tx.max_capacity() - tx.capacity())
    }

    /// Enqueues `job`, waiting for room if the queue is full.
    pub async fn submit(&self, job: J) -> Result<(), ServerError> {
        let tx = self.tx.as_ref().ok_or(ServerError::PoolClosed)?;
        tx.send(job).await.map_err(|_| ServerError::PoolClosed)
    }

    /// Closes the queue, lets workers finish what is already queued, and
    /// waits for them to exit.
    pub async fn shutdown(mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                error!(error = %e, "worker task failed");
            }
        }
    }
}

async fn work<J, H, Fut>(id: usize, rx: Arc<Mutex<mpsc::Receiver<J>>>, handler: Arc<H>)
where
    J: fmt::Display + Send + 'static,
    H: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    loop {
        let job = rx.lock().await.recv().await;
        let Some(job) = job else {
            debug!(worker = id, "queue closed, worker exiting");
            return;
        };

        let peer = job.to_string();
        // Child task so a panicking handler cannot take the worker down.
        match tokio::spawn(handler(job)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(worker = id, peer = %peer, error = %format!("{e:#}"), "connection failed");
            }
            Err(e) if e.is_panic() => {
                error!(worker = id, peer = %peer, "connection handler panicked");
            }
            Err(e) => {
                error!(worker = id, peer = %peer, error = %e, "connection task cancelled");
            }
        }
    }
}
