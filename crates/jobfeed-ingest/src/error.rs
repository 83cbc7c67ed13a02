//! Error types for the ingestion pipeline
//!
//! Every failure a pipeline run can end with is a variant of [`IngestError`].
//! A run reports exactly one of them: the first one observed.

use thiserror::Error;

/// Boxed error produced by record providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Why a record could not be turned into a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIssue {
    TooFewFields { found: usize, required: usize },
    EmptyExternalId,
}

impl std::fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatIssue::TooFewFields { found, required } => {
                write!(f, "has {} fields, at least {} required", found, required)
            },
            FormatIssue::EmptyExternalId => write!(f, "has an empty external id"),
        }
    }
}

/// Pipeline failure
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input could not be opened; no worker was started
    #[error("Failed to open record source '{origin}': {source}")]
    Resource {
        origin: String,
        #[source]
        source: BoxError,
    },

    /// Reading failed for a reason other than end of input
    #[error("Failed to read record {position}: {source}")]
    Io {
        position: u64,
        #[source]
        source: BoxError,
    },

    /// A record does not satisfy the job invariants
    #[error("Record {position} {issue}")]
    Format { position: u64, issue: FormatIssue },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A reader or worker context panicked or was aborted
    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

impl IngestError {
    /// Pipeline stage the error originated from, for logs
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Resource { .. } => "open",
            IngestError::Io { .. } => "reader",
            IngestError::Format { .. } => "worker",
            IngestError::InvalidConfig(_) => "config",
            IngestError::TaskFailed(_) => "task",
        }
    }

    /// Position of the offending record, when the error is tied to one
    pub fn position(&self) -> Option<u64> {
        match self {
            IngestError::Io { position, .. } | IngestError::Format { position, .. } => {
                Some(*position)
            },
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            IngestError::TaskFailed(format!("task panicked: {}", err))
        } else {
            IngestError::TaskFailed(format!("task cancelled: {}", err))
        }
    }
}
