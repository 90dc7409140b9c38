//! Wget Core Library
//!
//! This library provides the core functionality for the `wget` tool, which
//! fetches single files, URL lists and shallow website mirrors over HTTP.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Streaming transfer engine, write throttling and progress output
//! - [`mirror`] - Link extraction and the single-page mirroring job
//! - [`config`] - Resolution of command-line values into a run mode

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod mirror;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, Mode, RunConfig, RunOptions, expand_home, split_list};
pub use download::{
    BatchReport, DownloadError, HttpClient, RateLimit, RateLimitError, RateLimitedWriter,
    TransferLog, TransferOutcome, TransferProgress, TransferRequest, download_batch,
    read_url_list,
};
pub use mirror::{
    FilterDecision, LinkSet, MirrorError, MirrorFilter, MirrorJob, MirrorReport, MirrorStage,
    RootStatusCheck, extract_links, site_directory_name,
};
pub use user_agent::BROWSER_USER_AGENT;
