//! Bounded hand-off between the reader and the worker pool

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use super::types::RawRecord;

/// Create a dispatch queue holding at most `capacity` records.
pub(crate) fn work_queue(capacity: usize) -> (Dispatcher, WorkQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Dispatcher { tx },
        WorkQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Reader side. Dropping it tells the workers no more records are coming.
pub(crate) struct Dispatcher {
    tx: mpsc::Sender<RawRecord>,
}

impl Dispatcher {
    /// Hand a record to the pool, blocking the calling thread while the
    /// queue is full.
    ///
    /// Must only be called from a blocking context. Returns the record back
    /// if every worker has gone away.
    pub(crate) fn dispatch(&self, record: RawRecord) -> Result<(), RawRecord> {
        self.tx.blocking_send(record).map_err(|err| err.0)
    }
}

/// Worker side, shared by the whole pool. Each record is taken by exactly
/// one worker.
#[derive(Clone)]
pub(crate) struct WorkQueue {
    rx: Arc<Mutex<mpsc::Receiver<RawRecord>>>,
}

impl WorkQueue {
    /// Next record, or `None` once the dispatcher is gone and the queue is
    /// drained.
    pub(crate) async fn next(&self) -> Option<RawRecord> {
        self.rx.lock().await.recv().await
    }
}
