//! Download jobs and their lock-protected progress state.
//!
//! A [`Job`] is created by the [`Registry`](crate::registry::Registry) and
//! mutated only by the single [`Downloader`](crate::download::Downloader)
//! bound to it. Its identity (`id`, `url`, `started_at`) is immutable; every
//! other field lives behind the job's own mutex and is touched only through
//! the methods below, each of which is one short critical section that never
//! spans I/O.

mod progress;
mod status;
mod view;

pub use progress::{BYTES_PER_MB, percent_complete, whole_megabytes};
pub use status::JobStatus;
pub use view::JobView;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Identifier assigned by the registry at insertion time.
pub type JobId = u64;

/// Mutable fields, guarded by [`Job::state`].
#[derive(Debug, Default)]
struct JobState {
    name: String,
    finished_at: Option<DateTime<Utc>>,
    progress: u8,
    size_mb: u64,
    total_bytes: Option<u64>,
    is_done: bool,
    status: JobStatus,
    error: Option<String>,
}

/// One submitted download.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    url: String,
    started_at: DateTime<Utc>,
    claimed: AtomicBool,
    state: Mutex<JobState>,
}

impl Job {
    pub(crate) fn new(id: JobId, url: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            url,
            started_at,
            claimed: AtomicBool::new(false),
            state: Mutex::new(JobState::default()),
        }
    }

    /// Returns the registry-assigned identifier.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Returns the source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Copies every field in a single critical section.
    #[must_use]
    pub fn view(&self) -> JobView {
        let state = self.lock();
        JobView {
            id: self.id,
            url: self.url.clone(),
            name: state.name.clone(),
            started_at: self.started_at,
            finished_at: state.finished_at,
            progress: state.progress,
            size_mb: state.size_mb,
            is_done: state.is_done,
            status: state.status,
            size_known: state.total_bytes.is_some(),
            error: state.error.clone(),
        }
    }

    /// Marks this job as owned by a downloader.
    ///
    /// Returns false if another downloader already claimed it.
    pub(crate) fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Records the destination name and enters `Fetching`.
    pub(crate) fn begin_fetch(&self, name: String) {
        let mut state = self.lock();
        state.name = name;
        state.status = JobStatus::Fetching;
    }

    /// Switches the job to known-size accounting.
    ///
    /// `size_mb` becomes the declared total and stays fixed from here on.
    pub(crate) fn set_total_bytes(&self, total_bytes: u64) {
        let mut state = self.lock();
        state.total_bytes = Some(total_bytes);
        state.size_mb = whole_megabytes(total_bytes);
    }

    /// Accounts for `downloaded` bytes written so far.
    ///
    /// Known size advances `progress`; unknown size advances `size_mb`.
    /// Neither ever moves backwards.
    pub(crate) fn record_bytes(&self, downloaded: u64) {
        let mut state = self.lock();
        match state.total_bytes {
            Some(total) => {
                state.progress = state.progress.max(percent_complete(downloaded, total));
            }
            None => {
                state.size_mb = state.size_mb.max(whole_megabytes(downloaded));
            }
        }
    }

    /// Sets `is_done` and `finished_at` together. Only the first call has effect.
    pub(crate) fn complete(&self, finished_at: DateTime<Utc>) {
        let mut state = self.lock();
        if state.is_done {
            return;
        }
        state.is_done = true;
        state.finished_at = Some(finished_at);
        state.status = JobStatus::Completed;
    }

    /// Records a failure. `is_done` stays false.
    pub(crate) fn fail(&self, error: &impl fmt::Display) {
        let mut state = self.lock();
        if state.is_done {
            return;
        }
        state.status = JobStatus::Failed;
        state.error = Some(error.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(7, "https://example.com/a.iso".to_string(), Utc::now())
    }

    #[test]
    fn test_new_job_initial_view() {
        let job = job();
        let view = job.view();
        assert_eq!(view.id, 7);
        assert_eq!(view.url, "https://example.com/a.iso");
        assert_eq!(view.name, "");
        assert_eq!(view.progress, 0);
        assert_eq!(view.size_mb, 0);
        assert!(!view.is_done);
        assert!(view.finished_at.is_none());
        assert_eq!(view.status, JobStatus::Created);
        assert!(!view.size_known);
        assert!(view.error.is_none());
    }

    #[test]
    fn test_known_size_advances_progress_not_size() {
        let job = job();
        job.begin_fetch("7-a.iso".to_string());
        job.set_total_bytes(4 * BYTES_PER_MB);
        job.record_bytes(BYTES_PER_MB);
        let view = job.view();
        assert_eq!(view.status, JobStatus::Fetching);
        assert_eq!(view.name, "7-a.iso");
        assert!(view.size_known);
        assert_eq!(view.size_mb, 4);
        assert_eq!(view.progress, 25);
    }

    #[test]
    fn test_unknown_size_advances_size_not_progress() {
        let job = job();
        job.record_bytes(3 * BYTES_PER_MB + 5);
        let view = job.view();
        assert!(!view.size_known);
        assert_eq!(view.size_mb, 3);
        assert_eq!(view.progress, 0);
    }

    #[test]
    fn test_progress_never_decreases() {
        let job = job();
        job.set_total_bytes(100);
        job.record_bytes(60);
        job.record_bytes(10);
        assert_eq!(job.view().progress, 60);
    }

    #[test]
    fn test_complete_sets_done_and_finished_together() {
        let job = job();
        let finished = Utc::now();
        job.complete(finished);
        let view = job.view();
        assert!(view.is_done);
        assert_eq!(view.finished_at, Some(finished));
        assert_eq!(view.status, JobStatus::Completed);
    }

    #[test]
    fn test_complete_only_first_call_counts() {
        let job = job();
        let first = Utc::now();
        job.complete(first);
        job.complete(first + chrono::Duration::seconds(5));
        assert_eq!(job.view().finished_at, Some(first));
    }

    #[test]
    fn test_fail_keeps_job_not_done() {
        let job = job();
        job.fail(&"HTTP 404 downloading https://example.com/a.iso");
        let view = job.view();
        assert!(!view.is_done);
        assert!(view.finished_at.is_none());
        assert_eq!(view.status, JobStatus::Failed);
        assert!(view.error.unwrap().contains("404"));
    }

    #[test]
    fn test_claim_is_exclusive() {
        let job = job();
        assert!(job.try_claim());
        assert!(!job.try_claim());
    }

    #[test]
    fn test_view_serializes_wire_field_names() {
        let job = job();
        let json = serde_json::to_value(job.view()).unwrap();
        for key in ["id", "url", "name", "started_at", "progress", "size", "is_done"] {
            assert!(json.get(key).is_some(), "missing {key} in {json}");
        }
        assert!(json.get("finished_at").is_none());
        assert!(json.get("error").is_none());
    }
}
