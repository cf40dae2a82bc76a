//! Job lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a download job.
///
/// `Created → Fetching → {Completed | Failed}`. A failed job keeps
/// `is_done == false`; the status is what tells it apart from a slow one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Registered, no request issued yet.
    #[default]
    Created,
    /// Response accepted and body streaming to disk.
    Fetching,
    /// Every byte written; `is_done` and `finished_at` are set.
    Completed,
    /// Abandoned after a network, status, or storage error.
    Failed,
}

impl JobStatus {
    /// Returns the wire/display string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Fetching => "fetching",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true once the job can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
