//! HTTP transfer engine for streaming files to disk.
//!
//! This module provides functionality for downloading files from HTTP/HTTPS URLs
//! with streaming support, optional write throttling and wget-style progress output.
//!
//! # Features
//!
//! - Streaming transfers written in fixed 1 KiB chunks
//! - Optional byte-rate ceiling ([`RateLimitedWriter`])
//! - Progress line at most once per second plus a final line
//! - Structured error types with full context
//! - Sequential best-effort batches from a URL list
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wget_core::download::{HttpClient, TransferLog, TransferRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let request = TransferRequest::resolve("https://example.com/paper.pdf", None, Path::new("."))?
//!     .with_rate_limit(Some("400k".parse()?));
//! client.transfer(&request, &mut TransferLog::stdout()).await?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
pub mod constants;
mod error;
pub mod filename;
mod log;
mod progress;
pub mod rate_limiter;

pub use batch::{BatchReport, download_batch, read_url_list};
pub use client::{FetchedPage, HttpClient, TransferOutcome, TransferRequest};
pub use error::DownloadError;
pub use log::{BACKGROUND_LOG_FILE, TransferLog};
pub use progress::TransferProgress;
pub use rate_limiter::{RateLimit, RateLimitError, RateLimitedWriter};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
