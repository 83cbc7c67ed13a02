//! Jobfeed Ingest Library
//!
//! Turns tabular job exports into normalized [`Job`](jobfeed_common::Job)s
//! with a bounded pool of parallel workers.
//!
//! # Supported Inputs
//!
//! - **CSV** files or streams, any single-byte delimiter
//! - **JSON lines**, one array of strings per line
//! - **HTTP**: CSV documents fetched with a caller-supplied client
//! - **Memory**: rows already held by the caller
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_ingest::pipeline::{ingest, CsvProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let jobs = ingest(CsvProvider::from_path("./data/jobs.csv"), true, 4).await?;
//!     println!("ingested {} jobs", jobs.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod store;

pub use error::{IngestError, Result};
