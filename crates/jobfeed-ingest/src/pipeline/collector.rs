//! Fan-in of worker outcomes
//!
//! The collector is the only writer of the result set. Workers and the
//! reader only send outcomes to it.

use jobfeed_common::Job;
use tokio::sync::mpsc;

use super::types::Outcome;
use crate::error::Result;

#[derive(Debug, Default)]
pub(crate) struct Collector {
    jobs: Vec<Job>,
}

impl Collector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accumulate jobs until every sender is gone.
    ///
    /// Returns at the first error without waiting for the rest; the
    /// receiver is dropped on return so pending senders fail fast, and the
    /// jobs collected so far are discarded.
    pub(crate) async fn collect(mut self, mut outcomes: mpsc::Receiver<Outcome>) -> Result<Vec<Job>> {
        while let Some(outcome) = outcomes.recv().await {
            self.jobs.push(outcome?);
        }
        Ok(self.jobs)
    }
}
