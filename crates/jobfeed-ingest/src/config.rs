//! Ingestion configuration
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). Command-line flags override them.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineConfig;

/// Main ingestion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of transform workers
    pub workers: usize,
    /// Whether inputs start with a header row
    pub has_header: bool,
    /// Bounded queue size; the worker count when unset
    pub queue_capacity: Option<usize>,
    /// CSV field delimiter
    pub delimiter: u8,
    /// Timeout for fetching remote sources
    pub http_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            has_header: true,
            queue_capacity: None,
            delimiter: b',',
            http_timeout_secs: 30,
        }
    }
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    ///
    /// - `INGEST_WORKERS`: worker pool size (default 4)
    /// - `INGEST_HAS_HEADER`: true/false (default true)
    /// - `INGEST_QUEUE_CAPACITY`: dispatch queue size
    /// - `INGEST_DELIMITER`: single character, or `tab`
    /// - `INGEST_HTTP_TIMEOUT_SECS`: default 30
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();
        Self::default().merge_env()
    }

    fn merge_env(mut self) -> Result<Self> {
        if let Some(workers) = env_var("INGEST_WORKERS")? {
            self.workers = workers;
        }
        if let Some(has_header) = env_var("INGEST_HAS_HEADER")? {
            self.has_header = has_header;
        }
        if let Some(capacity) = env_var("INGEST_QUEUE_CAPACITY")? {
            self.queue_capacity = Some(capacity);
        }
        if let Ok(delimiter) = std::env::var("INGEST_DELIMITER") {
            self.delimiter = parse_delimiter(&delimiter).context("Invalid INGEST_DELIMITER")?;
        }
        if let Some(timeout) = env_var("INGEST_HTTP_TIMEOUT_SECS")? {
            self.http_timeout_secs = timeout;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.queue_capacity == Some(0) {
            bail!("queue capacity must be at least 1");
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let config = PipelineConfig::new(self.has_header, self.workers);
        match self.queue_capacity {
            Some(capacity) => config.with_queue_capacity(capacity),
            None => config,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parse a delimiter given as one ASCII character, or `tab`/`\t`.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => bail!("delimiter must be a single ASCII character, got '{}'", value),
        },
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}
