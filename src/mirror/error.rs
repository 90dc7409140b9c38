//! Error types for mirror jobs.

use std::path::PathBuf;

use thiserror::Error;

use super::job::MirrorStage;
use crate::download::DownloadError;

/// Errors that end a mirror job.
///
/// Individual asset failures are not errors at this level; they are collected
/// in the [`MirrorReport`](super::MirrorReport) and the job continues.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// No host-like token could be taken from the root URL.
    #[error("cannot extract domain name from URL: {url}")]
    Domain {
        /// The URL given for mirroring.
        url: String,
    },

    /// The site directory could not be created.
    #[error("error creating site directory {path}: {source}")]
    SiteDirectory {
        /// The site directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The root page could not be fetched or read.
    #[error("error fetching website: {source}")]
    Fetch {
        /// The underlying transfer error.
        #[source]
        source: DownloadError,
    },

    /// An implied directory could not be created.
    #[error("error creating directory {path}: {source}")]
    CreateDirectory {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The rewritten root page could not be saved.
    #[error("error writing {path}: {source}")]
    WriteIndex {
        /// The index file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The root page answered with a non-2xx status.
    #[error("Status {status} {reason} mirroring {url}")]
    RootStatus {
        /// The root URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase, empty when unknown.
        reason: &'static str,
        /// Last stage completed before the status was checked.
        after: MirrorStage,
    },
}

impl MirrorError {
    /// Creates a site directory error.
    pub fn site_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SiteDirectory {
            path: path.into(),
            source,
        }
    }

    /// Creates a fetch error.
    #[must_use]
    pub fn fetch(source: DownloadError) -> Self {
        Self::Fetch { source }
    }

    /// Creates an implied directory error.
    pub fn create_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDirectory {
            path: path.into(),
            source,
        }
    }

    /// Creates an index write error.
    pub fn write_index(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteIndex {
            path: path.into(),
            source,
        }
    }

    /// Creates a root status error, filling in the canonical reason phrase.
    pub fn root_status(url: impl Into<String>, status: u16, after: MirrorStage) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("");
        Self::RootStatus {
            url: url.into(),
            status,
            reason,
            after,
        }
    }

    /// The last stage the job reached before failing.
    #[must_use]
    pub fn stage(&self) -> MirrorStage {
        match self {
            Self::Domain { .. } | Self::SiteDirectory { .. } => MirrorStage::Start,
            Self::Fetch { .. } => MirrorStage::SiteDirCreated,
            Self::CreateDirectory { .. } => MirrorStage::LinksExtracted,
            Self::WriteIndex { .. } => MirrorStage::AssetsDownloaded,
            Self::RootStatus { after, .. } => *after,
        }
    }

    /// Short status line in the form `Status 404 Not Found`, if this is a status error.
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        match self {
            Self::RootStatus { status, reason, .. } => Some(format!("Status {status} {reason}")),
            _ => None,
        }
    }
}
