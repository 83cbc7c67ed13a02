//! Core types for the ingestion pipeline

use jobfeed_common::{Job, JobSource};

use crate::error::{IngestError, Result};

/// One input row as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based row number in the source, header row included
    position: u64,
    fields: Vec<String>,
}

impl RawRecord {
    pub fn new(position: u64, fields: Vec<String>) -> Self {
        Self { position, fields }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

/// What a worker (or the reader, on failure) reports to the collector.
pub type Outcome = Result<Job>;

/// Lifecycle of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not started yet
    Idle,
    /// Records are flowing
    Running,
    /// Source exhausted without errors; joining contexts
    Draining,
    /// First error observed; cancelling and joining contexts
    Failing,
    /// Every context has been joined
    Completed { success: bool },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed { .. })
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Size of the transform worker pool (at least 1)
    pub num_workers: usize,
    /// Discard the first row of the source
    pub has_header: bool,
    /// Capacity of the dispatch and outcome queues; defaults to `num_workers`
    pub queue_capacity: Option<usize>,
    /// Source stamped on every produced job
    pub source: JobSource,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            has_header: true,
            queue_capacity: None,
            source: JobSource::Csv,
        }
    }
}

impl PipelineConfig {
    pub fn new(has_header: bool, num_workers: usize) -> Self {
        Self {
            num_workers,
            has_header,
            ..Self::default()
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_source(mut self, source: JobSource) -> Self {
        self.source = source;
        self
    }

    /// Effective capacity of the bounded queues
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.num_workers).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(IngestError::InvalidConfig(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(IngestError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
