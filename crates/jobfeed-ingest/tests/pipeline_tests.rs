//! End-to-end tests for the ingestion pipeline
//!
//! These tests validate:
//! - Row counts and header handling
//! - Worker-count invariance of the produced job set
//! - First-error-wins for resource, read and format failures
//! - Every reader and worker context is gone once a run returns
//! - Fail-fast: an early error does not drain a large input

use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobfeed_common::{Job, JobSource};
use jobfeed_ingest::error::{BoxError, FormatIssue, IngestError};
use jobfeed_ingest::pipeline::{
    ingest, CsvProvider, MemoryProvider, Pipeline, PipelineConfig, PipelineState, RecordProvider,
    RecordReader,
};

// ============================================================================
// Helpers
// ============================================================================

fn row(id: usize) -> Vec<String> {
    vec![
        format!("ext{id}"),
        format!("Title {id}"),
        "Desc".to_string(),
        "Co".to_string(),
        "Loc".to_string(),
        format!("http://x/{id}"),
    ]
}

fn ids(jobs: &[Job]) -> BTreeSet<String> {
    jobs.iter().map(|job| job.external_id.clone()).collect()
}

/// Counters shared between a test and its synthetic source
#[derive(Clone, Default)]
struct Probe {
    pulled: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl Probe {
    fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Generates `total` rows lazily, optionally failing or producing a short
/// row at a given zero-based index.
struct SyntheticSource {
    total: usize,
    io_error_at: Option<usize>,
    short_row_at: Option<usize>,
    panic_at: Option<usize>,
    probe: Probe,
}

impl SyntheticSource {
    fn new(total: usize, probe: &Probe) -> Self {
        Self {
            total,
            io_error_at: None,
            short_row_at: None,
            panic_at: None,
            probe: probe.clone(),
        }
    }
}

struct SyntheticReader {
    source: SyntheticSource,
    next: usize,
}

impl RecordProvider for SyntheticSource {
    type Reader = SyntheticReader;

    fn describe(&self) -> String {
        format!("synthetic ({} rows)", self.total)
    }

    fn open(self) -> Result<Self::Reader, BoxError> {
        Ok(SyntheticReader {
            source: self,
            next: 0,
        })
    }
}

impl RecordReader for SyntheticReader {
    fn read_fields(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        let index = self.next;
        self.next += 1;
        self.source.probe.pulled.fetch_add(1, Ordering::SeqCst);

        if index >= self.source.total {
            return Ok(None);
        }
        if self.source.io_error_at == Some(index) {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        if self.source.panic_at == Some(index) {
            panic!("reader blew up at row {index}");
        }
        if self.source.short_row_at == Some(index) {
            return Ok(Some(vec![format!("ext{index}"), "short".to_string()]));
        }
        Ok(Some(row(index)))
    }
}

impl Drop for SyntheticReader {
    fn drop(&mut self) {
        self.source.probe.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Successful runs
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_job_count_matches_data_rows() {
    let mut csv = String::from("external_id,title,description,company,location,url\n");
    for id in 0..50 {
        csv.push_str(&row(id).join(","));
        csv.push('\n');
    }
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), csv).unwrap();

    let jobs = ingest(CsvProvider::from_path(file.path()), true, 4).await.unwrap();

    assert_eq!(jobs.len(), 50);
    assert_eq!(ids(&jobs).len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_header_row_is_excluded() {
    let csv = "id,title,description,company,location,url\n\
               ext1,A,D,C,L,http://a\n\
               ext2,B,D,C,L,http://b\n\
               ext3,C,D,C,L,http://c\n";

    let jobs = ingest(CsvProvider::from_reader(Cursor::new(csv), "inline"), true, 2)
        .await
        .unwrap();

    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().all(|job| job.source == JobSource::Csv));
    assert_eq!(
        ids(&jobs),
        ["ext1", "ext2", "ext3"].iter().map(|s| s.to_string()).collect()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_without_header_every_row_is_data() {
    let provider = MemoryProvider::new((0..5).map(row).collect());
    let jobs = ingest(provider, false, 2).await.unwrap();
    assert_eq!(jobs.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_job_set_is_independent_of_worker_count() {
    let rows: Vec<_> = (0..300).map(row).collect();

    let mut sets = Vec::new();
    for workers in [1, 2, 8] {
        let jobs = ingest(MemoryProvider::new(rows.clone()), false, workers)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 300, "workers = {workers}");
        sets.push(ids(&jobs));
    }

    assert_eq!(sets[0], sets[1]);
    assert_eq!(sets[1], sets[2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_employment_type_default_and_override() {
    let provider = MemoryProvider::from_rows([
        vec!["ext1", "Title", "Desc", "Co", "Loc", "http://x"],
        vec!["ext2", "Title", "Desc", "Co", "Loc", "http://x", "x", "contract"],
        vec!["ext3", "Title", "Desc", "Co", "Loc", "http://x", "x", ""],
    ]);

    let jobs = ingest(provider, false, 2).await.unwrap();
    let by_id = |id: &str| jobs.iter().find(|job| job.external_id == id).unwrap();

    assert_eq!(by_id("ext1").employment_type, "full-time");
    assert_eq!(by_id("ext2").employment_type, "contract");
    assert_eq!(by_id("ext3").employment_type, "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_more_workers_than_records() {
    let jobs = ingest(MemoryProvider::new((0..3).map(row).collect()), false, 64)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 3);

    let empty = ingest(MemoryProvider::default(), true, 16).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_configured_source_is_stamped_on_jobs() {
    let config = PipelineConfig::new(false, 2).with_source(JobSource::LinkedIn);
    let mut pipeline = Pipeline::new(config);
    let jobs = pipeline
        .run(MemoryProvider::new((0..4).map(row).collect()))
        .await
        .unwrap();

    assert!(jobs.iter().all(|job| job.source == JobSource::LinkedIn));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_small_queue_with_single_worker() {
    let probe = Probe::default();
    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 1).with_queue_capacity(1));

    let jobs = pipeline.run(SyntheticSource::new(2_000, &probe)).await.unwrap();

    assert_eq!(jobs.len(), 2_000);
    // Every row plus the end-of-input read
    assert_eq!(probe.pulled(), 2_001);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_row_fails_the_whole_run() {
    let provider = MemoryProvider::from_rows([
        vec!["ext1", "Title", "Desc", "Co", "Loc", "http://x"],
        vec!["ext2", "Title", "Desc"],
        vec!["ext3", "Title", "Desc", "Co", "Loc", "http://x"],
    ]);

    let err = ingest(provider, false, 2).await.unwrap_err();

    match err {
        IngestError::Format { position, issue } => {
            assert_eq!(position, 2);
            assert_eq!(issue, FormatIssue::TooFewFields { found: 3, required: 6 });
        },
        other => panic!("expected format error, got {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_missing_file_is_a_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    let mut pipeline = Pipeline::new(PipelineConfig::new(true, 4));

    let err = pipeline.run(CsvProvider::from_path(&path)).await.unwrap_err();

    assert!(matches!(err, IngestError::Resource { ref origin, .. } if origin.ends_with("nope.csv")));
    assert_eq!(pipeline.state(), PipelineState::Completed { success: false });
    assert_eq!(pipeline.live_contexts(), 0);
}

#[tokio::test]
async fn test_zero_workers_is_rejected() {
    let err = ingest(MemoryProvider::default(), true, 0).await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidConfig(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_io_error_at_first_record_returns_without_draining_input() {
    let probe = Probe::default();
    let mut source = SyntheticSource::new(1_000_000, &probe);
    source.io_error_at = Some(0);

    let result = tokio::time::timeout(Duration::from_secs(10), ingest(source, false, 4))
        .await
        .expect("pipeline did not fail fast");

    match result {
        Err(IngestError::Io { position, .. }) => assert_eq!(position, 1),
        other => panic!("expected io error, got {:?}", other.map(|jobs| jobs.len())),
    }
    assert_eq!(probe.pulled(), 1);
    assert_eq!(probe.released(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_format_error_stops_reading_early() {
    let probe = Probe::default();
    let mut source = SyntheticSource::new(1_000_000, &probe);
    source.short_row_at = Some(10);

    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 4));
    let err = pipeline.run(source).await.unwrap_err();

    assert_eq!(err.position(), Some(11));
    // Only what fits in the queues can be read past the failing row
    assert!(probe.pulled() < 1_000, "pulled {} rows", probe.pulled());
    assert_eq!(probe.released(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reader_panic_is_reported_not_swallowed() {
    let probe = Probe::default();
    let mut source = SyntheticSource::new(100, &probe);
    source.panic_at = Some(5);

    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 2));
    let err = pipeline.run(source).await.unwrap_err();

    assert!(matches!(err, IngestError::TaskFailed(_)));
    assert_eq!(probe.released(), 1);
    assert_eq!(pipeline.live_contexts(), 0);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_context_outlives_a_successful_run() {
    let probe = Probe::default();
    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 8));
    let mut state = pipeline.subscribe();

    let jobs = pipeline.run(SyntheticSource::new(500, &probe)).await.unwrap();

    assert_eq!(jobs.len(), 500);
    assert_eq!(pipeline.live_contexts(), 0);
    assert_eq!(probe.released(), 1);
    assert_eq!(
        *state.borrow_and_update(),
        PipelineState::Completed { success: true }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_context_outlives_a_failed_run() {
    let probe = Probe::default();
    let mut source = SyntheticSource::new(10_000, &probe);
    source.short_row_at = Some(500);

    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 8));
    assert!(pipeline.run(source).await.is_err());

    assert_eq!(pipeline.live_contexts(), 0);
    assert_eq!(probe.released(), 1);
    assert!(pipeline.state().is_terminal());
    assert_eq!(pipeline.state(), PipelineState::Completed { success: false });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pipeline_can_be_reused() {
    let mut pipeline = Pipeline::new(PipelineConfig::new(false, 3));

    let first = pipeline.run(MemoryProvider::new((0..10).map(row).collect())).await;
    let second = pipeline
        .run(MemoryProvider::from_rows([vec!["only", "one"]]))
        .await;
    let third = pipeline.run(MemoryProvider::new((0..7).map(row).collect())).await;

    assert_eq!(first.unwrap().len(), 10);
    assert!(second.is_err());
    assert_eq!(third.unwrap().len(), 7);
    assert_eq!(pipeline.live_contexts(), 0);
}
