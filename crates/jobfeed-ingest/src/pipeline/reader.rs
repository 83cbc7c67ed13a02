//! Source reader context
//!
//! Runs on a blocking thread: pulls rows from the opened source and feeds
//! them to the dispatcher until the input ends, a read fails, or the run is
//! cancelled.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::dispatch::Dispatcher;
use super::source::RecordReader;
use super::types::{Outcome, RawRecord};
use crate::error::IngestError;

/// How the reader stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReaderEnd {
    Exhausted,
    Failed,
    Cancelled,
}

#[derive(Debug)]
pub(crate) struct ReaderSummary {
    pub records_read: u64,
    pub end: ReaderEnd,
}

/// Drive `reader` to completion.
///
/// Read failures are reported through `outcomes` like any other error. The
/// source is dropped, and with it the underlying resource released, before
/// this returns.
pub(crate) fn run_reader<R: RecordReader>(
    mut reader: R,
    has_header: bool,
    dispatcher: Dispatcher,
    outcomes: mpsc::Sender<Outcome>,
    cancel: CancellationToken,
) -> ReaderSummary {
    let mut position = 0u64;
    let mut records_read = 0u64;

    let end = loop {
        if cancel.is_cancelled() {
            break ReaderEnd::Cancelled;
        }

        position += 1;
        match reader.read_fields() {
            Ok(Some(_)) if has_header && position == 1 => {
                trace!("Skipped header row");
            },
            Ok(Some(fields)) => {
                records_read += 1;
                if dispatcher.dispatch(RawRecord::new(position, fields)).is_err() {
                    break ReaderEnd::Cancelled;
                }
            },
            Ok(None) => break ReaderEnd::Exhausted,
            Err(source) => {
                // Nobody may be listening any more; that is fine.
                let _ = outcomes.blocking_send(Err(IngestError::Io { position, source }));
                break ReaderEnd::Failed;
            },
        }
    };

    drop(reader);
    debug!(records_read, end = ?end, "Record source released");

    ReaderSummary { records_read, end }
}
