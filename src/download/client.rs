//! HTTP client wrapper and the streaming transfer engine.
//!
//! This module provides the `HttpClient` struct which performs one GET per
//! transfer, streams the body to disk in fixed-size chunks (optionally through
//! a [`RateLimitedWriter`]) and reports progress to a [`TransferLog`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{BYTES_PER_MB, CONNECT_TIMEOUT_SECS, TRANSFER_CHUNK_SIZE};
use super::error::DownloadError;
use super::filename::file_name_from_url;
use super::log::TransferLog;
use super::progress::{ProgressThrottle, TransferProgress};
use super::rate_limiter::{RateLimit, RateLimitedWriter};
use crate::user_agent::BROWSER_USER_AGENT;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One resolved transfer: what to fetch, where to put it, how fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source URL.
    pub url: String,
    /// Destination file. Its parent directory must already exist.
    pub destination: PathBuf,
    /// Optional write throttle.
    pub rate_limit: Option<RateLimit>,
}

impl TransferRequest {
    /// Resolves the destination as `download_dir/<name>`, where `<name>` is
    /// `output_name` or, when absent, the final path segment of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `url` does not parse.
    pub fn resolve(
        url: &str,
        output_name: Option<&str>,
        download_dir: &Path,
    ) -> Result<Self, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let name = output_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| file_name_from_url(&parsed), ToString::to_string);

        Ok(Self {
            url: url.to_string(),
            destination: download_dir.join(name),
            rate_limit: None,
        })
    }

    /// Same request with a write throttle.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Final output path.
    pub path: PathBuf,
    /// Bytes written to `path`.
    pub bytes_transferred: u64,
    /// Size announced by the server, when known.
    pub total_bytes: Option<u64>,
}

/// A page body fetched as text, with its status left for the caller to judge.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Body decoded as text.
    pub body: String,
}

impl FetchedPage {
    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for transfers and page fetches.
///
/// This client is designed to be created once and reused for every transfer of
/// an invocation, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wget_core::download::{HttpClient, TransferLog, TransferRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let request = TransferRequest::resolve("https://example.com/file.zip", None, Path::new("."))?;
/// let mut log = TransferLog::stdout();
/// let outcome = client.transfer(&request, &mut log).await?;
/// println!("{} bytes", outcome.bytes_transferred);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default connect timeout.
    ///
    /// Only connection establishment is bounded; a response that stalls after
    /// connecting is waited on indefinitely.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
    }

    /// Creates a client with an explicit connect timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    #[instrument(level = "debug")]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Performs one GET and streams the body to `request.destination`.
    ///
    /// The destination is created (or truncated) only after a 2xx status was
    /// received. A failure while reading the body leaves the partially written
    /// file in place.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request cannot be sent or the body cannot be read
    /// - The server returns a non-2xx status
    /// - Creating or writing the destination fails
    #[instrument(skip(self, request, log), fields(url = %request.url))]
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        log: &mut TransferLog,
    ) -> Result<TransferOutcome, DownloadError> {
        let result = self.transfer_inner(request, log).await;
        if let Err(error) = &result {
            report_failure(log, error);
        }
        result
    }

    async fn transfer_inner(
        &self,
        request: &TransferRequest,
        log: &mut TransferLog,
    ) -> Result<TransferOutcome, DownloadError> {
        let url = request.url.as_str();
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        log.line(format_args!(
            "start at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ));
        let response = self.send_get(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let total_bytes = response.content_length();
        let path = request.destination.as_path();
        log.line(format_args!(
            "sending request, awaiting response... status {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        ));
        log.line(format_content_size(total_bytes));
        log.line(format_args!("saving file to: {}", path.display()));

        let file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        let mut sink = match request.rate_limit {
            Some(limit) => OutputSink::Throttled(RateLimitedWriter::new(file, limit)),
            None => OutputSink::Direct(BufWriter::new(file)),
        };

        let mut progress = TransferProgress::start(total_bytes);
        let streamed = stream_body(response, &mut sink, &mut progress, log, url, path).await;
        // Flush whatever was written, even when the body read failed part way.
        let flushed = sink.flush().await.map_err(|e| DownloadError::io(path, e));
        streamed?;
        flushed?;

        log.progress(&progress.render(true));
        log.line(format_args!("Downloaded [{url}]"));
        log.line(format_args!(
            "finished at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ));

        info!(
            path = %path.display(),
            bytes = progress.bytes_transferred,
            throttled = request.rate_limit.is_some(),
            "transfer complete"
        );

        Ok(TransferOutcome {
            path: path.to_path_buf(),
            bytes_transferred: progress.bytes_transferred,
            total_bytes,
        })
    }

    /// Fetches `url` and returns its body as text regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] or [`DownloadError::Network`].
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.send_get(url).await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        debug!(status, bytes = body.len(), "page fetched");
        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        self.client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))
    }
}

/// Destination file, written directly or through the throttle.
enum OutputSink {
    Direct(BufWriter<File>),
    Throttled(RateLimitedWriter<File>),
}

impl OutputSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Direct(writer) => writer.write_all(chunk).await,
            Self::Throttled(writer) => writer.write(chunk).await.map(|_| ()),
        }
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Direct(writer) => writer.flush().await,
            Self::Throttled(writer) => writer.flush().await,
        }
    }
}

/// Streams the response body into `sink` in [`TRANSFER_CHUNK_SIZE`] pieces.
async fn stream_body(
    response: reqwest::Response,
    sink: &mut OutputSink,
    progress: &mut TransferProgress,
    log: &mut TransferLog,
    url: &str,
    path: &Path,
) -> Result<(), DownloadError> {
    let mut stream = response.bytes_stream();
    let mut throttle = ProgressThrottle::default();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        for piece in chunk.chunks(TRANSFER_CHUNK_SIZE) {
            sink.write_chunk(piece)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            progress.advance(piece.len());

            if throttle.should_emit() {
                log.progress(&progress.render(false));
            }
        }
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_content_size(total_bytes: Option<u64>) -> String {
    match total_bytes {
        Some(total) => format!(
            "content size: {total} [~{:.2}MB]",
            total as f64 / BYTES_PER_MB
        ),
        None => "content size: unknown".to_string(),
    }
}

fn report_failure(log: &mut TransferLog, error: &DownloadError) {
    match error.status_line() {
        Some(status_line) => log.line(status_line),
        None => log.line(format_args!("Error: {error}")),
    }
    warn!(error = %error, "transfer failed");
}
