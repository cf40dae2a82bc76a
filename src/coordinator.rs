//! Job submission.
//!
//! The [`Coordinator`] is the only entry point that creates jobs. A
//! submission validates the URL, registers a job, and spawns exactly one
//! [`Downloader`] task for it without waiting on the fetch.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::download::Downloader;
use crate::job::JobView;
use crate::registry::Registry;

/// Errors reported synchronously to the submitter. No job is created.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The submission carried no URL, or only whitespace.
    #[error("url is required")]
    MissingUrl,
}

/// Accepts submissions and launches their downloads.
#[derive(Debug, Clone)]
pub struct Coordinator {
    registry: Arc<Registry>,
    downloader: Arc<Downloader>,
}

impl Coordinator {
    /// Creates a coordinator over a shared registry and downloader.
    #[must_use]
    pub fn new(registry: Arc<Registry>, downloader: Arc<Downloader>) -> Self {
        Self {
            registry,
            downloader,
        }
    }

    /// The registry jobs are inserted into.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Registers a job for `url` and starts its download in the background.
    ///
    /// Returns the job's initial snapshot (`progress = 0`, `is_done = false`)
    /// immediately. Scheme and reachability are not checked here; bad URLs
    /// surface as a failed job.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::MissingUrl`] if `url` is empty or blank.
    #[instrument(level = "debug", skip(self))]
    pub fn submit(&self, url: &str) -> Result<JobView, SubmitError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SubmitError::MissingUrl);
        }

        let job = self.registry.insert(url);
        let view = job.view();
        info!(job_id = view.id, url = %view.url, "new job added");

        let downloader = Arc::clone(&self.downloader);
        tokio::spawn(async move {
            // Outcome is already logged and recorded on the job.
            let _ = downloader.run(&job).await;
        });

        Ok(view)
    }
}
