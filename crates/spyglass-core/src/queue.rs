//! Serialized job queue for registration tasks.
//!
//! Registration mutates shared state (the counter, the identifier set, the
//! record sequence) across suspension points, so registration jobs run
//! strictly one at a time, in submission order, on a single worker task. A
//! job's failure rejects only its own ticket; the worker keeps draining.
//!
//! Depth is bounded: a full queue rejects further jobs instead of buffering
//! without limit.

use crate::config::HostConfig;
use crate::error::{Result, SpyglassError};
use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type Job = BoxFuture<'static, ()>;

/// FIFO queue of asynchronous jobs drained by one worker.
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
    depth: usize,
}

impl JobQueue {
    /// Create a queue and spawn its worker.
    ///
    /// Must be called from within a Tokio runtime. The worker exits when the
    /// queue is dropped and every buffered job has run.
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        let (tx, mut rx) = mpsc::channel::<Job>(depth);

        tokio::spawn(async move {
            // One job at a time, in submission order. A job's internal
            // suspension points never let another job start.
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("job queue worker stopped");
        });

        Self { tx, depth }
    }

    /// Submit a job. Returns a ticket that settles with the job's outcome
    /// once the worker has run it.
    ///
    /// # Errors
    /// `QueueFull` when the queue is at capacity, `QueueClosed` when the
    /// worker has shut down. Dropping the ticket does not cancel the job.
    pub fn enqueue<T, F>(&self, task: F) -> Result<JobTicket<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            let outcome = task.await;
            // The submitter may have dropped its ticket; the job still ran.
            let _ = done_tx.send(outcome);
        });

        self.tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SpyglassError::QueueFull { depth: self.depth },
            mpsc::error::TrySendError::Closed(_) => SpyglassError::QueueClosed,
        })?;

        Ok(JobTicket { rx: done_rx })
    }
}

/// Pending outcome of a submitted job.
pub struct JobTicket<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> JobTicket<T> {
    /// Wait for the job to run and return its outcome.
    pub async fn outcome(self) -> Result<T> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(SpyglassError::QueueClosed),
        }
    }
}
