//! Pipeline coordinator
//!
//! Owns one ingestion run end to end:
//! 1. Open the source off the async runtime (resource errors end the run here)
//! 2. Start the worker pool and the reader
//! 3. Collect outcomes until the input is exhausted or the first error arrives
//! 4. Cancel what is left and join every reader and worker context
//!
//! The run returns either every job or exactly one error, never both.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use jobfeed_common::Job;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::collector::Collector;
use super::dispatch::work_queue;
use super::reader::{run_reader, ReaderSummary};
use super::source::RecordProvider;
use super::types::{PipelineConfig, PipelineState};
use super::worker::{run_worker, WorkerSummary};
use crate::error::{IngestError, Result};

/// How a reader or worker context finished
#[derive(Debug)]
enum ContextExit {
    Reader(ReaderSummary),
    Worker(WorkerSummary),
}

/// Number of reader and worker contexts still running.
#[derive(Debug, Clone, Default)]
struct LiveContexts(Arc<AtomicUsize>);

impl LiveContexts {
    fn enter(&self) -> LiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        LiveGuard(Arc::clone(&self.0))
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Decrements the live count when the owning context ends, however it ends.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrent ingestion pipeline
pub struct Pipeline {
    config: PipelineConfig,
    state: watch::Sender<PipelineState>,
    live: LiveContexts,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            config,
            state,
            live: LiveContexts::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// State of the most recent run
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Follow state transitions as they happen
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Reader and worker contexts currently alive. Always zero once
    /// [`Pipeline::run`] has returned.
    pub fn live_contexts(&self) -> usize {
        self.live.count()
    }

    fn transition(&self, next: PipelineState) {
        let previous = self.state.send_replace(next);
        debug!(from = ?previous, to = ?next, "Pipeline state changed");
    }

    /// Run the pipeline over `provider`.
    ///
    /// Dropping the returned future cancels the run: workers are aborted and
    /// the reader stops at its next record.
    ///
    /// Runs are exclusive: state and the live-context count describe one run
    /// at a time, so a pipeline is borrowed mutably for the whole call.
    #[instrument(
        skip_all,
        fields(origin = %provider.describe(), workers = self.config.num_workers)
    )]
    pub async fn run<P: RecordProvider>(&mut self, provider: P) -> Result<Vec<Job>> {
        self.config.validate()?;

        let started = Instant::now();
        let origin = provider.describe();
        self.transition(PipelineState::Running);

        let reader = match tokio::task::spawn_blocking(move || provider.open()).await {
            Ok(Ok(reader)) => reader,
            Ok(Err(source)) => return self.fail_early(IngestError::Resource { origin, source }),
            Err(join_err) => return self.fail_early(join_err.into()),
        };

        info!(
            has_header = self.config.has_header,
            queue_capacity = self.config.queue_capacity(),
            "Starting ingestion"
        );

        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let capacity = self.config.queue_capacity();
        let (dispatcher, queue) = work_queue(capacity);
        let (outcome_tx, outcome_rx) = mpsc::channel(capacity);
        let mut contexts = JoinSet::new();

        for worker_id in 0..self.config.num_workers {
            let live = self.live.enter();
            let worker = run_worker(
                worker_id,
                queue.clone(),
                outcome_tx.clone(),
                self.config.source,
                cancel.clone(),
            );
            contexts.spawn(async move {
                let _live = live;
                ContextExit::Worker(worker.await)
            });
        }
        // Workers hold the only queue handles, so the dispatcher fails once they are all gone
        drop(queue);

        let live = self.live.enter();
        let has_header = self.config.has_header;
        let reader_cancel = cancel.clone();
        contexts.spawn_blocking(move || {
            let _live = live;
            ContextExit::Reader(run_reader(
                reader,
                has_header,
                dispatcher,
                outcome_tx,
                reader_cancel,
            ))
        });

        let collected = Collector::new().collect(outcome_rx).await;

        match &collected {
            Ok(_) => self.transition(PipelineState::Draining),
            Err(err) => {
                warn!(stage = err.stage(), error = %err, "Ingestion failed, cancelling");
                self.transition(PipelineState::Failing);
                cancel.cancel();
            },
        }

        let task_failure = join_contexts(&mut contexts, &cancel).await;

        let result = match (collected, task_failure) {
            (Err(err), _) => Err(err),
            (Ok(_), Some(err)) => {
                warn!(error = %err, "Ingestion context failed");
                self.transition(PipelineState::Failing);
                Err(err)
            },
            (Ok(jobs), None) => Ok(jobs),
        };

        self.transition(PipelineState::Completed {
            success: result.is_ok(),
        });

        match &result {
            Ok(jobs) => info!(
                jobs = jobs.len(),
                elapsed = ?started.elapsed(),
                "Ingestion complete"
            ),
            Err(err) => info!(
                stage = err.stage(),
                elapsed = ?started.elapsed(),
                "Ingestion aborted"
            ),
        }

        result
    }

    fn fail_early(&self, err: IngestError) -> Result<Vec<Job>> {
        warn!(stage = err.stage(), error = %err, "Ingestion failed before start");
        self.transition(PipelineState::Failing);
        self.transition(PipelineState::Completed { success: false });
        Err(err)
    }
}

/// Join every context. Returns the first panic or abort, cancelling the rest
/// of the run when one shows up.
async fn join_contexts(
    contexts: &mut JoinSet<ContextExit>,
    cancel: &CancellationToken,
) -> Option<IngestError> {
    let mut failure = None;

    while let Some(joined) = contexts.join_next().await {
        match joined {
            Ok(ContextExit::Reader(summary)) => debug!(
                records_read = summary.records_read,
                end = ?summary.end,
                "Reader finished"
            ),
            Ok(ContextExit::Worker(summary)) => debug!(
                worker_id = summary.worker_id,
                transformed = summary.transformed,
                rejected = summary.rejected,
                "Worker finished"
            ),
            Err(join_err) => {
                cancel.cancel();
                if failure.is_none() {
                    failure = Some(IngestError::from(join_err));
                }
            },
        }
    }

    failure
}

/// Ingest every record of `provider` with a pool of `num_workers` workers.
///
/// Returns all jobs, in no particular order, or the first error observed.
///
/// # Example
///
/// ```no_run
/// use jobfeed_ingest::pipeline::{ingest, CsvProvider};
///
/// # async fn run() -> jobfeed_ingest::error::Result<()> {
/// let jobs = ingest(CsvProvider::from_path("jobs.csv"), true, 4).await?;
/// println!("{} jobs", jobs.len());
/// # Ok(())
/// # }
/// ```
pub async fn ingest<P: RecordProvider>(
    provider: P,
    has_header: bool,
    num_workers: usize,
) -> Result<Vec<Job>> {
    Pipeline::new(PipelineConfig::new(has_header, num_workers))
        .run(provider)
        .await
}
