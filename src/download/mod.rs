//! HTTP download engine streaming job bodies to disk.
//!
//! This module provides the [`Downloader`], which executes exactly one job's
//! fetch and keeps that job's progress fields current, and the
//! [`HttpClient`] it fetches through.
//!
//! # Example
//!
//! ```no_run
//! use fetchboard_core::download::{Downloader, HttpClient};
//! use fetchboard_core::registry::Registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let downloader = Downloader::new(HttpClient::new(), "Downloads");
//! let job = registry.insert("https://example.com/file.iso");
//! let path = downloader.run(&job).await?;
//! println!("Downloaded: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod downloader;
mod error;
mod filename;

pub use client::HttpClient;
pub use constants::{CHUNK_SIZE, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use downloader::Downloader;
pub use error::DownloadError;
