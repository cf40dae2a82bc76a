//! Per-job download executor.
//!
//! A [`Downloader`] drives one job from `Created` to `Completed` or `Failed`:
//! it issues the request, names and creates the destination file, then
//! streams the body in fixed 32 KiB reads, writing each chunk before
//! accounting for it on the job.
//!
//! # Locking
//!
//! The downloader is the only writer of its job. Each update is one call on
//! [`Job`], which takes the job's lock for just the fields it changes and
//! releases it before the next network read or disk write. The registry lock
//! is never touched here.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use futures_util::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, warn};

use super::client::declared_content_length;
use super::constants::CHUNK_SIZE;
use super::filename::job_file_name;
use super::{DownloadError, HttpClient};
use crate::job::Job;

/// Streams job URLs into files under one output directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    output_dir: PathBuf,
}

impl Downloader {
    /// Creates a downloader writing into `output_dir`.
    ///
    /// The directory must already exist; it is not created here.
    #[must_use]
    pub fn new(client: HttpClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Runs `job` to completion or failure.
    ///
    /// Failures are logged and recorded on the job (status `failed`, with
    /// the error text); `is_done` stays false. There is no retry.
    ///
    /// # Errors
    ///
    /// Returns the error that abandoned the job, or
    /// [`DownloadError::AlreadyClaimed`] if another downloader owns it (in
    /// which case the job is left untouched).
    #[instrument(skip_all, fields(job_id = job.id(), url = %job.url()))]
    pub async fn run(&self, job: &Job) -> Result<PathBuf, DownloadError> {
        if !job.try_claim() {
            warn!("job already has a downloader, not starting another");
            return Err(DownloadError::AlreadyClaimed { job_id: job.id() });
        }

        info!("job processing");
        match self.fetch(job).await {
            Ok(path) => Ok(path),
            Err(error) => {
                warn!(error = %error, "download failed, abandoning job");
                job.fail(&error);
                Err(error)
            }
        }
    }

    async fn fetch(&self, job: &Job) -> Result<PathBuf, DownloadError> {
        let response = self.client.get(job.url()).await?;

        let name = job_file_name(job.id(), response.url());
        let path = self.output_dir.join(&name);
        job.begin_fetch(name);

        let mut file = File::create(&path)
            .await
            .map_err(|e| DownloadError::io(&path, e))?;

        let total_bytes = declared_content_length(&response);
        if let Some(total) = total_bytes {
            job.set_total_bytes(total);
        }
        debug!(
            path = %path.display(),
            total_bytes,
            size_known = total_bytes.is_some(),
            "destination created"
        );

        let result = stream_to_file(job, response, &mut file, &path).await;
        drop(file);

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %path.display(), "removing partial file after error");
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "failed to remove partial file");
                }
                return Err(error);
            }
        };

        job.complete(Utc::now());
        info!(path = %path.display(), bytes, "download complete");
        Ok(path)
    }
}

/// Copies the body into `file` in [`CHUNK_SIZE`] reads, returning bytes written.
///
/// A zero-length read is end of stream. Each chunk is written before it is
/// counted, and the file is flushed before returning.
async fn stream_to_file(
    job: &Job,
    response: reqwest::Response,
    file: &mut File,
    path: &Path,
) -> Result<u64, DownloadError> {
    let url = response.url().to_string();
    let body = response.bytes_stream().map_err(io::Error::other);
    let reader = StreamReader::new(body);
    tokio::pin!(reader);

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| DownloadError::read(&url, e))?;
        if read == 0 {
            break;
        }

        file.write_all(&buffer[..read])
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        downloaded += read as u64;
        job.record_bytes(downloaded);
    }

    file.flush().await.map_err(|e| DownloadError::io(path, e))?;
    Ok(downloaded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use crate::registry::Registry;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_refuses_second_downloader_for_same_job() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new();
        let job = registry.insert("not a url");
        let downloader = Downloader::new(HttpClient::new(), temp.path());

        let first = downloader.run(&job).await;
        assert!(matches!(first, Err(DownloadError::InvalidUrl { .. })));
        let failed = job.view();

        let second = downloader.run(&job).await;
        assert!(matches!(
            second,
            Err(DownloadError::AlreadyClaimed { job_id: 1 })
        ));
        assert_eq!(job.view(), failed, "second run must not touch the job");
    }

    #[tokio::test]
    async fn test_run_invalid_url_marks_failed_without_name() {
        let temp = TempDir::new().unwrap();
        let registry = Registry::new();
        let job = registry.insert("ftp//broken");
        let downloader = Downloader::new(HttpClient::new(), temp.path());

        let _ = downloader.run(&job).await;

        let view = job.view();
        assert_eq!(view.status, JobStatus::Failed);
        assert!(!view.is_done);
        assert_eq!(view.name, "");
        assert_eq!(view.progress, 0);
        assert!(view.error.unwrap().contains("invalid URL"));
    }
}
