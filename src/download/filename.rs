//! Destination name derivation and safe relative path resolution.
//!
//! This module derives file names from URLs for single and batch transfers,
//! and turns mirrored asset references into relative paths that cannot leave
//! the site directory.

use std::path::{Component, Path, PathBuf};

use url::Url;

/// Name used when the URL path ends in `/` (or has no path at all).
pub const DEFAULT_INDEX_NAME: &str = "index.html";

/// Derives the destination file name from the final path segment of `url`.
///
/// The segment is percent-decoded and sanitized; an empty final segment
/// yields [`DEFAULT_INDEX_NAME`].
#[must_use]
pub fn file_name_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).map_or_else(
            |e| {
                tracing::debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
                last.to_string()
            },
            std::borrow::Cow::into_owned,
        );
        return sanitize_filename(&decoded);
    }

    DEFAULT_INDEX_NAME.to_string()
}

/// Sanitizes a filename for safe filesystem use.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
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
        sanitized.replace('.', "_")
    }
}

/// Converts a mirrored reference such as `/css/site.css` or `./img/a.png` into
/// a path relative to the site directory.
///
/// Leading slashes are dropped. Returns `None` when the reference would
/// resolve outside the site directory (`..` components) or names no file.
#[must_use]
pub fn relative_asset_path(reference: &str) -> Option<PathBuf> {
    let trimmed = reference.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut path = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (path.file_name().is_some()).then_some(path)
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
