//! Error types shared across jobfeed crates

use thiserror::Error;

/// Result type alias for jobfeed operations
pub type Result<T> = std::result::Result<T, JobfeedError>;

/// Main error type for jobfeed
#[derive(Error, Debug)]
pub enum JobfeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown job source: {0}")]
    UnknownSource(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),
}
