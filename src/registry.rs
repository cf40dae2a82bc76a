//! Shared, append-only, ordered collection of download jobs.
//!
//! The registry owns one collection-level lock that guards only the job list
//! and the identifier counter. It is never held while a job's own lock is
//! taken: [`Registry::snapshot`] clones the job handles, releases the
//! collection lock, and only then copies each job under that job's lock.
//! Downloaders never touch the registry lock at all, so there is no lock
//! ordering cycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, instrument};

use crate::job::{Job, JobId, JobView};

/// Identifier given to the first inserted job.
const FIRST_JOB_ID: JobId = 1;

#[derive(Debug)]
struct RegistryInner {
    next_id: JobId,
    jobs: Vec<Arc<Job>>,
}

/// Ordered set of every job submitted during the life of the process.
///
/// Jobs are never removed or reordered.
#[derive(Debug)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: FIRST_JOB_ID,
                jobs: Vec::new(),
            }),
        }
    }

    /// Creates a job for `url`, assigns it the next identifier and appends it.
    ///
    /// Identifier assignment and insertion happen in one critical section, so
    /// concurrent callers always receive distinct, increasing identifiers.
    #[instrument(level = "debug", skip_all)]
    pub fn insert(&self, url: impl Into<String>) -> Arc<Job> {
        let url = url.into();
        let started_at = Utc::now();
        let job = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            let job = Arc::new(Job::new(id, url, started_at));
            inner.jobs.push(Arc::clone(&job));
            job
        };
        debug!(job_id = job.id(), url = %job.url(), "job registered");
        job
    }

    /// Returns a copy of every job, in insertion order.
    ///
    /// Each job is copied atomically with respect to its own updates; jobs may
    /// be observed at slightly different instants relative to each other.
    #[must_use]
    pub fn snapshot(&self) -> Vec<JobView> {
        self.jobs().iter().map(|job| job.view()).collect()
    }

    /// Returns the job with `id`, if any.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<Arc<Job>> {
        let inner = self.lock();
        // Identifiers are dense and start at FIRST_JOB_ID.
        let index = usize::try_from(id.checked_sub(FIRST_JOB_ID)?).ok()?;
        inner.jobs.get(index).cloned()
    }

    /// Number of jobs ever submitted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Returns true if no job has been submitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    fn jobs(&self) -> Vec<Arc<Job>> {
        self.lock().jobs.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_insert_assigns_sequential_ids_from_one() {
        let registry = Registry::new();
        let a = registry.insert("https://example.com/a");
        let b = registry.insert("https://example.com/b");
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let registry = Registry::new();
        for name in ["a", "b", "c"] {
            registry.insert(format!("https://example.com/{name}"));
        }
        let urls: Vec<String> = registry.snapshot().into_iter().map(|v| v.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
    }

    #[test]
    fn test_get_by_id() {
        let registry = Registry::new();
        registry.insert("https://example.com/a");
        let b = registry.insert("https://example.com/b");
        assert_eq!(registry.get(2).unwrap().url(), b.url());
        assert!(registry.get(0).is_none());
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_snapshot_reflects_job_updates() {
        let registry = Registry::new();
        let job = registry.insert("https://example.com/a");
        job.begin_fetch("1-a".to_string());
        assert_eq!(registry.snapshot()[0].name, "1-a");
    }

    #[test]
    fn test_concurrent_inserts_produce_unique_ids() {
        let registry = Arc::new(Registry::new());
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..per_thread)
                        .map(|i| registry.insert(format!("https://example.com/{t}/{i}")).id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: Vec<JobId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<JobId> = ids.iter().copied().collect();

        let total = threads * per_thread;
        assert_eq!(registry.len(), total);
        assert_eq!(unique.len(), total);
        let expected: HashSet<JobId> = (1..=total as JobId).collect();
        assert_eq!(unique, expected);

        let snapshot_ids: Vec<JobId> = registry.snapshot().iter().map(|v| v.id).collect();
        let mut sorted = snapshot_ids.clone();
        sorted.sort_unstable();
        assert_eq!(snapshot_ids, sorted, "insertion order must follow id order");
    }
}
