//! Concurrent record-to-job ingestion pipeline
//!
//! Reader → dispatcher → worker pool → collector, supervised by the
//! [`Pipeline`] coordinator. The first error from any stage ends the run;
//! every context is joined before the call returns.

mod collector;
pub mod coordinator;
mod dispatch;
mod reader;
pub mod source;
pub mod types;
pub mod worker;

// Re-export commonly used types
pub use coordinator::{ingest, Pipeline};
pub use source::{CsvProvider, JsonLinesProvider, MemoryProvider, RecordProvider, RecordReader};
pub use types::{Outcome, PipelineConfig, PipelineState, RawRecord};
pub use worker::{transform_record, MIN_FIELDS};
