//! Job persistence contract
//!
//! Downstream stores upsert jobs keyed by `(external_id, source)`:
//! applying the same batch twice leaves the store unchanged.

use std::collections::HashMap;

use async_trait::async_trait;
use jobfeed_common::{Job, JobSource, Result};
use tokio::sync::RwLock;
use tracing::debug;

/// Counts from one upsert call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Idempotent job sink
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert new jobs and update changed ones, keyed by `(external_id, source)`.
    ///
    /// The whole batch is rejected if any job violates the key contract.
    async fn upsert(&self, jobs: Vec<Job>) -> Result<UpsertReport>;

    async fn count(&self) -> Result<usize>;
}

/// In-memory store used by the CLI and tests
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<(String, JobSource), Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, external_id: &str, source: JobSource) -> Option<Job> {
        self.jobs
            .read()
            .await
            .get(&(external_id.to_string(), source))
            .cloned()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn upsert(&self, jobs: Vec<Job>) -> Result<UpsertReport> {
        for job in &jobs {
            job.validate()?;
        }

        let mut report = UpsertReport::default();
        let mut stored = self.jobs.write().await;

        for job in jobs {
            let key = (job.external_id.clone(), job.source);
            match stored.get_mut(&key) {
                Some(existing) if *existing == job => report.unchanged += 1,
                Some(existing) => {
                    *existing = job;
                    report.updated += 1;
                },
                None => {
                    stored.insert(key, job);
                    report.inserted += 1;
                },
            }
        }

        debug!(
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            "Upserted jobs"
        );
        Ok(report)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.jobs.read().await.len())
    }
}
