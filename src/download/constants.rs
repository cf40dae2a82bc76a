//! Constants for the download module (timeouts, chunking).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Size of each body read while streaming to disk (32 KiB).
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Name used when the resolved URL path has no final segment.
pub const FALLBACK_BASENAME: &str = "download";
