//! Bounded write pool
//!
//! A fixed number of workers drain a bounded queue of members and upsert
//! each one into the store. Every queued member is attempted by exactly one
//! worker, once. Failures are not retried; each worker keeps its own list
//! and hands it back through its join handle when the queue closes, so no
//! failure list is shared between workers.
//!
//! The queue is bounded: once it is full, [`WritePool::submit`] waits for a
//! worker to take an item, which keeps memory flat on very large uploads.

use callsign_common::{Member, MemberStore, StoreError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ImportError;

/// One rejected upsert
#[derive(Debug)]
pub struct WriteFailure {
    pub callsign: String,
    pub error: StoreError,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "writing {}: {}", self.callsign, self.error)
    }
}

/// Fixed-size pool of store writers fed by a bounded queue
pub struct WritePool {
    tx: mpsc::Sender<Member>,
    workers: Vec<JoinHandle<Vec<WriteFailure>>>,
    cancel: CancellationToken,
}

impl WritePool {
    /// Start `writers` workers behind a queue holding at most `queue_capacity` members
    ///
    /// Both sizes are clamped to at least 1.
    pub fn spawn(
        store: Arc<dyn MemberStore>,
        writers: usize,
        queue_capacity: usize,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..writers.max(1))
            .map(|id| {
                tokio::spawn(write_worker(
                    id,
                    Arc::clone(&store),
                    Arc::clone(&rx),
                    cancel.clone(),
                ))
            })
            .collect();

        Self {
            tx,
            workers,
            cancel,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue one member for writing, waiting while the queue is full
    pub async fn submit(&self, member: Member) -> Result<(), ImportError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ImportError::Cancelled),
            sent = self.tx.send(member) => sent.map_err(|_| ImportError::WritersStopped),
        }
    }

    /// Close the queue, wait for every worker, and collect all failures
    ///
    /// Returns only after the last in-flight write has finished.
    pub async fn finish(self) -> Result<Vec<WriteFailure>, ImportError> {
        let WritePool { tx, workers, .. } = self;
        drop(tx);

        let mut failures = Vec::new();
        let mut panicked = None;
        for handle in workers {
            match handle.await {
                Ok(mut worker_failures) => failures.append(&mut worker_failures),
                Err(e) => panicked = Some(e.to_string()),
            }
        }

        match panicked {
            Some(msg) => Err(ImportError::WriterPanicked(msg)),
            None => Ok(failures),
        }
    }

    /// Stop workers from taking new items, then wait for in-flight writes
    pub async fn abort(self) {
        self.cancel.cancel();
        if let Err(e) = self.finish().await {
            warn!("Write pool did not shut down cleanly: {}", e);
        }
    }
}

async fn write_worker(
    id: usize,
    store: Arc<dyn MemberStore>,
    rx: Arc<Mutex<mpsc::Receiver<Member>>>,
    cancel: CancellationToken,
) -> Vec<WriteFailure> {
    let mut failures = Vec::new();
    let mut written = 0usize;

    loop {
        // Hold the receiver lock only while waiting for the next item
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            member = async { rx.lock().await.recv().await } => member,
        };

        let Some(member) = next else {
            break;
        };

        match store.put(&member).await {
            Ok(()) => written += 1,
            Err(error) => {
                warn!(worker = id, callsign = %member.callsign, "Write failed: {}", error);
                failures.push(WriteFailure {
                    callsign: member.callsign,
                    error,
                });
            }
        }
    }

    debug!(
        worker = id,
        written,
        failed = failures.len(),
        "Writer finished"
    );
    failures
}
