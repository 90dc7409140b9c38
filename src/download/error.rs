//! Error types for the download module.
//!
//! This module defines structured errors for all transfer operations,
//! providing context-rich error messages for debugging and user feedback.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a transfer.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request could not be sent or the response body could not be read
    /// (DNS resolution, connection refused, reset mid-stream, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx HTTP response.
    #[error("Status {status} {reason} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status, empty when unknown.
        reason: &'static str,
    },

    /// File system error during a transfer (create file, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error, filling in the canonical reason phrase.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("");
        Self::HttpStatus {
            url: url.into(),
            status,
            reason,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Short status line in the form `Status 404 Not Found`, if this is a status error.
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        match self {
            Self::HttpStatus { status, reason, .. } => Some(format!("Status {status} {reason}")),
            _ => None,
        }
    }
}

// Context (url, path) is required for every variant, so there are no
// `From<reqwest::Error>` / `From<std::io::Error>` impls; use the helper
// constructors instead.
