//! Fixed-size worker pool.
//!
//! `size` workers pull jobs from a shared FIFO queue. Submission never
//! blocks; jobs beyond the pool size wait in the queue. Each job runs on its
//! own tokio task so a panicking job does not take its worker down.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A unit of work accepted by the pool.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Worker pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker pool needs at least one worker")]
    NoWorkers,

    #[error("Worker pool is shut down")]
    ShutDown,
}

/// Explicitly sized pool of async workers.
///
/// The pool lives as long as its owner keeps it; dropping it or calling
/// [`WorkerPool::shutdown`] stops the workers, aborts running jobs and drops
/// queued ones.
pub struct WorkerPool {
    size: usize,
    tx: mpsc::UnboundedSender<Job>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `size` workers on the current tokio runtime.
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::NoWorkers);
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let shutdown = CancellationToken::new();

        let workers = (0..size)
            .map(|index| {
                let rx = rx.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    worker_loop(index, rx, shutdown).await;
                })
            })
            .collect();

        info!(workers = size, "Worker pool started");

        Ok(Self {
            size,
            tx,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Number of workers, i.e. the maximum number of concurrently running jobs.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled() || self.tx.is_closed()
    }

    /// Queue a job. Returns immediately.
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return Err(PoolError::ShutDown);
        }
        self.tx
            .send(Box::pin(job))
            .map_err(|_| PoolError::ShutDown)
    }

    /// Stop all workers and wait for them to exit.
    ///
    /// Running jobs are aborted and queued jobs are dropped without running.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker exited abnormally");
            }
        }

        info!(workers = self.size, "Worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn worker_loop(
    index: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    shutdown: CancellationToken,
) {
    debug!(worker = index, "Worker started");

    loop {
        // Only one idle worker waits on the queue at a time; the rest wait
        // on the lock, which hands jobs out in FIFO order.
        let job = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                job = rx.recv() => job,
            }
        };

        let Some(job) = job else {
            break;
        };

        let mut handle = tokio::spawn(job);
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                handle.abort();
                let _ = handle.await;
                break;
            }
            result = &mut handle => {
                if let Err(e) = result {
                    if e.is_panic() {
                        warn!(worker = index, "Job panicked");
                    }
                }
            }
        }
    }

    // Drop anything still queued so its resources are released now.
    let mut rx = rx.lock().await;
    rx.close();
    while rx.try_recv().is_ok() {}

    debug!(worker = index, "Worker stopped");
}
