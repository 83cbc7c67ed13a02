//! Record providers
//!
//! A [`RecordProvider`] knows how to open some tabular input; the
//! [`RecordReader`] it opens yields rows one at a time until the input ends.
//! Byte-level parsing (CSV quoting, JSON decoding) lives here, never in the
//! pipeline itself.
//!
//! End of input is reported as `Ok(None)`. `Err` always means a genuine read
//! failure.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use crate::error::BoxError;

/// Opens a tabular source.
///
/// Opening may block (file or socket I/O); the pipeline calls it off the
/// async runtime.
pub trait RecordProvider: Send + 'static {
    type Reader: RecordReader;

    /// Human-readable name of the source, used in errors and logs
    fn describe(&self) -> String;

    /// Acquire the underlying resource.
    fn open(self) -> Result<Self::Reader, BoxError>;
}

/// Sequential access to the rows of an opened source.
///
/// The reader owns the underlying resource; dropping it releases the
/// resource.
pub trait RecordReader: Send + 'static {
    /// Next row, or `Ok(None)` at end of input.
    fn read_fields(&mut self) -> Result<Option<Vec<String>>, BoxError>;
}

// ============================================================================
// CSV
// ============================================================================

enum CsvInput {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Delimited text from a file or any byte stream
pub struct CsvProvider {
    input: CsvInput,
    origin: String,
    delimiter: u8,
}

impl CsvProvider {
    /// Read from a file; the file is opened when the pipeline starts.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            origin: path.display().to_string(),
            input: CsvInput::Path(path),
            delimiter: b',',
        }
    }

    /// Read from an already open stream (network body, in-memory bytes).
    pub fn from_reader(reader: impl Read + Send + 'static, origin: impl Into<String>) -> Self {
        Self {
            input: CsvInput::Reader(Box::new(reader)),
            origin: origin.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl RecordProvider for CsvProvider {
    type Reader = CsvRecordReader;

    fn describe(&self) -> String {
        self.origin.clone()
    }

    fn open(self) -> Result<Self::Reader, BoxError> {
        let stream: Box<dyn Read + Send> = match self.input {
            CsvInput::Path(path) => Box::new(File::open(&path)?),
            CsvInput::Reader(reader) => reader,
        };

        // Ragged rows are let through so short rows surface as format
        // errors from the workers instead of read errors here.
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(stream);

        Ok(CsvRecordReader {
            inner,
            record: csv::StringRecord::new(),
        })
    }
}

pub struct CsvRecordReader {
    inner: csv::Reader<Box<dyn Read + Send>>,
    record: csv::StringRecord,
}

impl RecordReader for CsvRecordReader {
    fn read_fields(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        if self.inner.read_record(&mut self.record)? {
            Ok(Some(self.record.iter().map(str::to_owned).collect()))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// One JSON array of strings per line, e.g. `["ext1","Title",...]`
pub struct JsonLinesProvider {
    path: PathBuf,
}

impl JsonLinesProvider {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordProvider for JsonLinesProvider {
    type Reader = JsonLinesRecordReader<BufReader<File>>;

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(self) -> Result<Self::Reader, BoxError> {
        let file = File::open(&self.path)?;
        Ok(JsonLinesRecordReader {
            inner: serde_jsonlines::JsonLinesReader::new(BufReader::new(file)),
        })
    }
}

pub struct JsonLinesRecordReader<R> {
    inner: serde_jsonlines::JsonLinesReader<R>,
}

impl<R: BufRead + Send + 'static> RecordReader for JsonLinesRecordReader<R> {
    fn read_fields(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        Ok(self.inner.read::<Vec<String>>()?)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Rows already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    rows: Vec<Vec<String>>,
}

impl MemoryProvider {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build from borrowed string rows, handy in tests
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

impl RecordProvider for MemoryProvider {
    type Reader = std::vec::IntoIter<Vec<String>>;

    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }

    fn open(self) -> Result<Self::Reader, BoxError> {
        Ok(self.rows.into_iter())
    }
}

impl RecordReader for std::vec::IntoIter<Vec<String>> {
    fn read_fields(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        Ok(self.next())
    }
}
