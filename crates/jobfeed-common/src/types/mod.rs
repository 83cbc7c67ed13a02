//! Common types used across jobfeed

use serde::{Deserialize, Serialize};

use crate::error::JobfeedError;

/// Employment type assigned when a source row does not carry one.
pub const DEFAULT_EMPLOYMENT_TYPE: &str = "full-time";

/// Where a job posting came from.
///
/// Together with [`Job::external_id`] this forms the deduplication key used
/// by downstream stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Indeed,
    #[serde(rename = "linkedin")]
    LinkedIn,
    Csv,
}

impl JobSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Indeed => "indeed",
            JobSource::LinkedIn => "linkedin",
            JobSource::Csv => "csv",
        }
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobSource {
    type Err = JobfeedError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indeed" => Ok(JobSource::Indeed),
            "linkedin" => Ok(JobSource::LinkedIn),
            "csv" => Ok(JobSource::Csv),
            _ => Err(JobfeedError::UnknownSource(s.to_string())),
        }
    }
}

/// A normalized job posting.
///
/// Built once per valid input row and handed to the caller by value.
///
/// # Examples
///
/// ```rust
/// use jobfeed_common::types::{Job, JobSource, DEFAULT_EMPLOYMENT_TYPE};
///
/// let job = Job {
///     external_id: "ext1".to_string(),
///     title: "Rust Engineer".to_string(),
///     description: "Build pipelines".to_string(),
///     company: "Acme".to_string(),
///     location: "Remote".to_string(),
///     url: "https://example.com/jobs/ext1".to_string(),
///     source: JobSource::Csv,
///     employment_type: DEFAULT_EMPLOYMENT_TYPE.to_string(),
/// };
/// assert_eq!(job.key(), ("ext1", JobSource::Csv));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    /// Identifier assigned by the originating source, never empty
    pub external_id: String,

    pub title: String,

    pub description: String,

    pub company: String,

    pub location: String,

    pub url: String,

    /// Source the job was ingested from
    pub source: JobSource,

    /// e.g. "full-time", "contract"
    pub employment_type: String,
}

impl Job {
    /// Upsert key: `(external_id, source)`
    pub fn key(&self) -> (&str, JobSource) {
        (&self.external_id, self.source)
    }

    /// Check the invariants downstream stores rely on.
    pub fn validate(&self) -> crate::Result<()> {
        if self.external_id.is_empty() {
            return Err(JobfeedError::InvalidJob(format!(
                "empty external_id for {} job '{}'",
                self.source, self.title
            )));
        }
        Ok(())
    }
}
