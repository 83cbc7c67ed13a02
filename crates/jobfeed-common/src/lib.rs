//! Jobfeed Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling and logging for the jobfeed workspace.
//!
//! # Overview
//!
//! - **Types**: the normalized [`Job`](types::Job) entity and its [`JobSource`](types::JobSource)
//! - **Error Handling**: [`JobfeedError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_common::types::JobSource;
//!
//! let source: JobSource = "csv".parse().unwrap();
//! assert_eq!(source, JobSource::Csv);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{JobfeedError, Result};
pub use types::{Job, JobSource};
