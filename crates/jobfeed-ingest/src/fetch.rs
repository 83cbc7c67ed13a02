//! Network-backed CSV input
//!
//! The HTTP client is always passed in by the caller so runs stay
//! independent of each other and easy to point at a mock server.

use std::io::Cursor;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::pipeline::CsvProvider;

/// Build the HTTP client used for fetching remote sources
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("jobfeed-ingest/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Download a CSV document and wrap it as a record provider.
///
/// Transport failures and non-success statuses are resource errors: the
/// input could not be opened.
pub async fn fetch_csv(client: &Client, url: &str) -> Result<CsvProvider> {
    let resource_error = |source: reqwest::Error| IngestError::Resource {
        origin: url.to_string(),
        source: Box::new(source),
    };

    let response = client.get(url).send().await.map_err(resource_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Resource {
            origin: url.to_string(),
            source: format!("server responded with {}", status).into(),
        });
    }

    let body = response.bytes().await.map_err(resource_error)?;
    info!(url, size_bytes = body.len(), "Fetched CSV source");

    Ok(CsvProvider::from_reader(Cursor::new(body), url))
}
