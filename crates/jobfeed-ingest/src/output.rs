//! JSON-lines output of ingested jobs

use std::io::Write;

use jobfeed_common::{Job, Result};
use serde_jsonlines::JsonLinesWriter;

/// Write one JSON object per job and flush. Returns the number written.
pub fn write_jobs<W: Write>(writer: W, jobs: &[Job]) -> Result<usize> {
    let mut out = JsonLinesWriter::new(writer);
    for job in jobs {
        out.write(job)?;
    }
    out.flush()?;
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobfeed_common::JobSource;

    #[test]
    fn test_write_jobs_one_object_per_line() {
        let job = Job {
            external_id: "ext1".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            company: "C".to_string(),
            location: "L".to_string(),
            url: "U".to_string(),
            source: JobSource::Csv,
            employment_type: "contract".to_string(),
        };

        let mut buf = Vec::new();
        let written = write_jobs(&mut buf, &[job.clone(), job]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(written, 2);
        assert_eq!(text.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["source"], "csv");
        assert_eq!(first["employment_type"], "contract");
    }
}
