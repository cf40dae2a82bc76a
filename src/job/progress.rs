//! Byte accounting helpers shared by jobs and the display.
//!
//! Both conversions truncate: 0 bytes of a nonzero total is 0%, and an
//! unknown-size download under one mebibyte reports 0 MB.

/// Bytes per reported megabyte.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Whole percentage of `total` covered by `downloaded`, clamped to 100.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percent_complete(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = u128::from(downloaded) * 100 / u128::from(total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Whole megabytes contained in `bytes`.
#[must_use]
pub fn whole_megabytes(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}
