//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::HeaderValue;
use axum::http::header::CONTENT_LENGTH;
use axum::response::IntoResponse;
use axum::routing::get;
use fetchboard_core::{Coordinator, Downloader, HttpClient, JobId, JobView, Registry};
use tempfile::TempDir;

/// How long a test waits for a job to reach a terminal status.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(10);

/// Path the streaming server serves its body on.
pub const STREAM_PATH: &str = "/stream/data.bin";

/// Shape of the body served by [`spawn_stream_server`].
#[derive(Debug, Clone, Copy)]
pub struct StreamPlan {
    /// Bytes per chunk.
    pub chunk_size: usize,
    /// Number of chunks sent.
    pub chunks: usize,
    /// Pause before each chunk.
    pub delay: Duration,
    /// Send `Content-Length` for the full body.
    pub declare_length: bool,
    /// Abort the body with an error after this many chunks.
    pub fail_after: Option<usize>,
}

impl StreamPlan {
    /// A chunked body with no `Content-Length` header.
    pub fn unknown_size(chunk_size: usize, chunks: usize) -> Self {
        Self {
            chunk_size,
            chunks,
            delay: Duration::ZERO,
            declare_length: false,
            fail_after: None,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        (self.chunk_size * self.chunks) as u64
    }
}

/// Starts a local server that streams `plan` at [`STREAM_PATH`].
///
/// Returns the base URL (`http://127.0.0.1:PORT`).
pub async fn spawn_stream_server(plan: StreamPlan) -> String {
    let app = Router::new().route(
        STREAM_PATH,
        get(move || async move { stream_response(plan) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn stream_response(plan: StreamPlan) -> axum::response::Response {
    let stream = futures_util::stream::unfold(0usize, move |sent| async move {
        if sent == plan.chunks {
            return None;
        }
        if !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }
        if plan.fail_after == Some(sent) {
            return Some((Err(std::io::Error::other("connection dropped")), plan.chunks));
        }
        Some((Ok(Bytes::from(vec![b'x'; plan.chunk_size])), sent + 1))
    });

    let mut response = Body::from_stream(stream).into_response();
    if plan.declare_length {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(plan.total_bytes()));
    }
    response
}

/// A coordinator over a fresh registry, writing into `dir`.
pub fn coordinator(dir: &TempDir) -> Coordinator {
    Coordinator::new(
        Arc::new(Registry::new()),
        Arc::new(Downloader::new(HttpClient::new(), dir.path())),
    )
}

/// Polls `registry` until job `id` is completed or failed.
pub async fn wait_for_terminal(registry: &Registry, id: JobId) -> JobView {
    let deadline = Instant::now() + JOB_TIMEOUT;
    loop {
        let view = registry.get(id).expect("job should exist").view();
        if view.status.is_terminal() {
            return view;
        }
        assert!(
            Instant::now() < deadline,
            "job {id} did not finish in time: {view:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Names of the files in `dir`, sorted.
pub fn file_names(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("read output dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
