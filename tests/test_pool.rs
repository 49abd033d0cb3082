use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use liteserve::server::pool::WorkerPool;
use tokio::sync::{Mutex, Semaphore};

#[tokio::test]
async fn test_pool_runs_every_job() {
    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    let pool = WorkerPool::new(4, 16, move |_job: u32| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    for job in 0..100 {
        pool.submit(job).await.unwrap();
    }
    pool.shutdown().await;

    assert_eq!(done.load(Ordering::SeqCst), 100);
}

#[tokio::test]
async fn test_single_worker_is_fifo() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let pool = WorkerPool::new(1, 8, move |job: u32| {
        let log = Arc::clone(&log);
        async move {
            log.lock().await.push(job);
            Ok(())
        }
    });

    for job in 0..8 {
        pool.submit(job).await.unwrap();
    }
    pool.shutdown().await;

    assert_eq!(*seen.lock().await, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_workers_survive_failures_and_panics() {
    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    let pool = WorkerPool::new(1, 8, move |job: u32| {
        let counter = Arc::clone(&counter);
        async move {
            match job % 3 {
                0 => anyhow::bail!("job {job} failed"),
                1 => panic!("job {job} panicked"),
                _ => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
    });

    for job in 0..9 {
        pool.submit(job).await.unwrap();
    }
    pool.shutdown().await;

    assert_eq!(done.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_submit_waits_when_queue_is_full() {
    let gate = Arc::new(Semaphore::new(0));
    let started = Arc::new(AtomicUsize::new(0));

    let (g, s) = (Arc::clone(&gate), Arc::clone(&started));
    let pool = WorkerPool::new(1, 1, move |_job: u32| {
        let gate = Arc::clone(&g);
        let started = Arc::clone(&s);
        async move {
            started.fetch_add(1, Ordering::SeqCst);
            let _permit = gate.acquire().await?;
            Ok(())
        }
    });

    // First job occupies the worker, second fills the queue.
    pool.submit(1).await.unwrap();
    while started.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    pool.submit(2).await.unwrap();
    assert_eq!(pool.queued(), 1);

    let blocked = tokio::time::timeout(Duration::from_millis(50), pool.submit(3)).await;
    assert!(blocked.is_err(), "submit should wait for queue space");

    gate.add_permits(3);
    pool.submit(3).await.unwrap();
    pool.shutdown().await;

    assert_eq!(started.load(Ordering::SeqCst), 3);
}
