//! Fetchboard Core Library
//!
//! This library provides the core of the fetchboard service, which accepts
//! download URLs over an HTTP API, fetches each one concurrently, and exposes
//! a live snapshot of every job's byte-level progress.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`job`] - A single download job and its lock-protected progress state
//! - [`registry`] - The shared, append-only, ordered collection of jobs
//! - [`download`] - HTTP client and the per-job streaming downloader
//! - [`coordinator`] - Submission: validate, register, launch a downloader
//! - [`server`] - Axum routes for `GET /files` and `POST /files/add`
//! - [`display`] - Periodic terminal rendering of the registry snapshot
//! - [`config`] - File configuration loading and validation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod display;
pub mod download;
pub mod job;
pub mod registry;
pub mod server;
mod user_agent;

// Re-export commonly used types
pub use coordinator::{Coordinator, SubmitError};
pub use download::{DownloadError, Downloader, HttpClient};
pub use job::{Job, JobId, JobStatus, JobView};
pub use registry::Registry;
