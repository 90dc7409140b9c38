//! Sequential best-effort transfers from a URL list.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::client::{HttpClient, TransferRequest};
use super::error::DownloadError;
use super::log::TransferLog;

/// Tally of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// URLs that were saved.
    pub completed: Vec<String>,
    /// URLs that failed, with the reason.
    pub failed: Vec<(String, DownloadError)>,
}

impl BatchReport {
    /// Number of URLs attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Reads a newline-delimited URL list.
///
/// Surrounding whitespace is trimmed and blank lines are skipped.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the file cannot be read.
pub fn read_url_list(path: &Path) -> Result<Vec<String>, DownloadError> {
    let text = std::fs::read_to_string(path).map_err(|e| DownloadError::io(path, e))?;
    Ok(parse_url_list(&text))
}

fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Transfers every URL from `input_file` into `download_dir`, one after another.
///
/// A failing URL is reported and the loop moves on; only an unreadable list
/// aborts the batch.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if `input_file` cannot be read.
#[instrument(skip(client, log), fields(input = %input_file.display()))]
pub async fn download_batch(
    client: &HttpClient,
    input_file: &Path,
    download_dir: &Path,
    log: &mut TransferLog,
) -> Result<BatchReport, DownloadError> {
    log.line(format_args!(
        "Downloading multiple files from {}",
        input_file.display()
    ));
    let urls = match read_url_list(input_file) {
        Ok(urls) => urls,
        Err(error) => {
            log.line(format_args!("Error reading URLs from file: {error}"));
            return Err(error);
        }
    };
    debug!(count = urls.len(), "URL list loaded");

    let mut report = BatchReport::default();
    for url in urls {
        let outcome = match TransferRequest::resolve(&url, None, download_dir) {
            Ok(request) => client.transfer(&request, log).await,
            Err(error) => {
                log.line(format_args!("Error: {error}"));
                Err(error)
            }
        };
        match outcome {
            Ok(_) => report.completed.push(url),
            Err(error) => report.failed.push((url, error)),
        }
    }

    log.line("Download finished");
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "batch complete"
    );
    Ok(report)
}
