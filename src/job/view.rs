//! Point-in-time copy of a job, as served by `GET /files`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{JobId, JobStatus};

/// Snapshot of one job's fields, copied under the job's lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    /// Registry-assigned identifier.
    pub id: JobId,
    /// Source URL as submitted.
    pub url: String,
    /// Destination filename; empty until the fetch begins.
    pub name: String,
    /// When the job was submitted.
    pub started_at: DateTime<Utc>,
    /// When the last byte was written. Absent until completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Whole percent complete; 0 while the total size is unknown.
    pub progress: u8,
    /// Total size in MB when known, otherwise MB downloaded so far.
    #[serde(rename = "size")]
    pub size_mb: u64,
    /// True once the fetch completed successfully.
    pub is_done: bool,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Whether the server declared a content length.
    pub size_known: bool,
    /// Failure description for failed jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
