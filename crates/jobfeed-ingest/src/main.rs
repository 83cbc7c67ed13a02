//! Jobfeed Ingest - convert tabular job exports into normalized jobs

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jobfeed_common::logging::{init_logging, LogConfig, LogLevel};
use jobfeed_ingest::config::{parse_delimiter, IngestConfig};
use jobfeed_ingest::fetch::{build_client, fetch_csv};
use jobfeed_ingest::output::write_jobs;
use jobfeed_ingest::pipeline::{CsvProvider, JsonLinesProvider, Pipeline, RecordProvider};
use jobfeed_ingest::store::{JobStore, MemoryJobStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jobfeed-ingest")]
#[command(author, version, about = "Jobfeed ingestion tool")]
struct Cli {
    /// Input format
    #[command(subcommand)]
    input: Input,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Input {
    /// Ingest a CSV file or URL
    Csv {
        /// CSV file to read
        #[arg(required_unless_present = "url", conflicts_with = "url")]
        path: Option<PathBuf>,

        /// Fetch the CSV over HTTP instead
        #[arg(long)]
        url: Option<String>,

        /// Field delimiter (single character or "tab")
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<u8>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Ingest a JSON-lines file (one array of strings per line)
    Jsonl {
        path: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// The first row is data, not a header
    #[arg(long)]
    no_header: bool,

    /// Write jobs as JSON lines to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut IngestConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_header {
            config.has_header = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("jobfeed-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let mut config = IngestConfig::from_env()?;

    match cli.input {
        Input::Csv {
            path,
            url,
            delimiter,
            run,
        } => {
            run.apply(&mut config);
            if let Some(delimiter) = delimiter {
                config.delimiter = delimiter;
            }

            let provider = match (path, url) {
                (_, Some(url)) => {
                    let client = build_client(config.http_timeout())?;
                    fetch_csv(&client, &url).await?
                },
                (Some(path), None) => CsvProvider::from_path(path),
                (None, None) => anyhow::bail!("either a path or --url is required"),
            };

            execute(provider.with_delimiter(config.delimiter), &config, run.output).await
        },
        Input::Jsonl { path, run } => {
            run.apply(&mut config);
            execute(JsonLinesProvider::from_path(path), &config, run.output).await
        },
    }
}

async fn execute<P: RecordProvider>(
    provider: P,
    config: &IngestConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;

    let mut pipeline = Pipeline::new(config.pipeline_config());
    let jobs = pipeline.run(provider).await?;

    let written = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_jobs(BufWriter::new(file), &jobs)?
        },
        None => write_jobs(std::io::stdout().lock(), &jobs)?,
    };

    let store = MemoryJobStore::new();
    let report = store.upsert(jobs).await?;

    info!(
        written,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        "Jobs stored"
    );
    Ok(())
}
