//! Transform workers
//!
//! Each worker pulls raw records off the shared queue, maps them to
//! [`Job`]s and forwards exactly one outcome per record to the collector.
//! Workers hold no shared mutable state.

use jobfeed_common::types::DEFAULT_EMPLOYMENT_TYPE;
use jobfeed_common::{Job, JobSource};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::dispatch::WorkQueue;
use super::types::{Outcome, RawRecord};
use crate::error::{FormatIssue, IngestError, Result};

/// Minimum number of fields a row needs to become a job
pub const MIN_FIELDS: usize = 6;

/// Zero-based column holding the optional employment type
pub const EMPLOYMENT_TYPE_FIELD: usize = 7;

/// Map one raw record to a job.
///
/// Column layout: `external_id, title, description, company, location, url`,
/// one ignored column, then an optional employment type. The default applies
/// only when that column is missing; an empty value is kept as is.
pub fn transform_record(record: RawRecord, source: JobSource) -> Result<Job> {
    let position = record.position();

    if record.len() < MIN_FIELDS {
        return Err(IngestError::Format {
            position,
            issue: FormatIssue::TooFewFields {
                found: record.len(),
                required: MIN_FIELDS,
            },
        });
    }

    if record.field(0).is_some_and(str::is_empty) {
        return Err(IngestError::Format {
            position,
            issue: FormatIssue::EmptyExternalId,
        });
    }

    let employment_type = record
        .field(EMPLOYMENT_TYPE_FIELD)
        .unwrap_or(DEFAULT_EMPLOYMENT_TYPE)
        .to_string();

    let mut fields = record.into_fields().into_iter();
    let mut next = || fields.next().unwrap_or_default();

    Ok(Job {
        external_id: next(),
        title: next(),
        description: next(),
        company: next(),
        location: next(),
        url: next(),
        source,
        employment_type,
    })
}

#[derive(Debug, Default)]
pub(crate) struct WorkerSummary {
    pub worker_id: usize,
    pub transformed: u64,
    pub rejected: u64,
}

/// Worker loop: runs until the queue is closed and drained, the collector
/// goes away, the run is cancelled, or this worker rejects a record.
pub(crate) async fn run_worker(
    worker_id: usize,
    queue: WorkQueue,
    outcomes: mpsc::Sender<Outcome>,
    source: JobSource,
    cancel: CancellationToken,
) -> WorkerSummary {
    let mut summary = WorkerSummary {
        worker_id,
        ..WorkerSummary::default()
    };

    loop {
        let record = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = queue.next() => match next {
                Some(record) => record,
                None => break,
            },
        };

        let outcome = transform_record(record, source);
        let rejected = match &outcome {
            Ok(_) => {
                summary.transformed += 1;
                false
            },
            Err(err) => {
                summary.rejected += 1;
                debug!(worker_id, error = %err, "Rejected record");
                true
            },
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = outcomes.send(outcome) => {
                if sent.is_err() {
                    break;
                }
            },
        }

        // The run is over once a record is rejected
        if rejected {
            break;
        }
    }

    summary
}
