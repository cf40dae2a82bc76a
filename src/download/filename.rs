//! Destination filename derivation.

use std::path::{Component, Path};

use tracing::debug;
use url::Url;

use super::constants::FALLBACK_BASENAME;
use crate::job::JobId;

/// Builds the destination filename for a job: `"{id}-{basename}"`.
///
/// `basename` is the last non-empty segment of the resolved URL path,
/// percent-decoded and sanitized. The id prefix keeps concurrent jobs that
/// target the same remote file from colliding on disk.
#[must_use]
pub(crate) fn job_file_name(id: JobId, resolved_url: &Url) -> String {
    format!("{id}-{}", basename_from_url(resolved_url))
}

/// Last non-empty path segment of `url`, or [`FALLBACK_BASENAME`].
pub(crate) fn basename_from_url(url: &Url) -> String {
    let Some(last) = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
    else {
        return FALLBACK_BASENAME.to_string();
    };

    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    let sanitized = sanitize_filename(&decoded);
    if sanitized.trim_matches('_').is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        sanitized
    }
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
