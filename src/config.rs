//! Resolution of raw command-line values into a validated run mode.
//!
//! The binary's clap layer fills a [`RunOptions`]; [`RunConfig::resolve`]
//! expands the download directory, parses the rate limit, splits the mirror
//! filter lists and picks the [`Mode`]. Precedence: batch (`-i`), then
//! mirror (`--mirror`), then single file. With neither a URL nor an input file
//! the mode is [`Mode::Usage`].

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::download::{DownloadError, RateLimit, RateLimitError, TransferRequest};
use crate::mirror::{MirrorFilter, MirrorJob, RootStatusCheck};

/// Default download directory.
pub const DEFAULT_DOWNLOAD_DIR: &str = ".";

const SEPARATORS: [char; 2] = ['/', std::path::MAIN_SEPARATOR];

/// Errors raised while resolving options, before any transfer starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `--rate-limit` value could not be parsed.
    #[error("invalid rate limit '{value}': {source}")]
    InvalidRateLimit {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        #[source]
        source: RateLimitError,
    },

    /// A path starts with `~` but the home directory is unknown.
    #[error("cannot expand '{path}': home directory not found")]
    HomeDirectory {
        /// The path as given.
        path: String,
    },

    /// The single-file URL is malformed.
    #[error("{source}")]
    InvalidUrl {
        /// The underlying transfer error.
        #[source]
        source: DownloadError,
    },
}

/// Raw option values as they come off the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Positional target URL.
    pub url: Option<String>,
    /// `-B`: route single-file output to `wget-log`.
    pub background: bool,
    /// `-O`: destination file name.
    pub output_document: Option<String>,
    /// `-P`: download directory; `None` means the current directory.
    pub directory_prefix: Option<String>,
    /// `--rate-limit`, e.g. `400k` or `2M`.
    pub rate_limit: Option<String>,
    /// `-i`: newline-delimited URL list.
    pub input_file: Option<String>,
    /// `--mirror`.
    pub mirror: bool,
    /// `--reject`: comma-separated suffixes.
    pub reject: Option<String>,
    /// `-X`: comma-separated path prefixes.
    pub exclude_directories: Option<String>,
    /// `--strict-status`: check the mirror root status before any work.
    pub strict_status: bool,
}

/// What one invocation does.
#[derive(Debug, Clone)]
pub enum Mode {
    /// No URL and no input file: print usage and exit successfully.
    Usage,
    /// One file.
    Single {
        /// Resolved transfer, rate limit included.
        request: TransferRequest,
        /// Write transfer output to `wget-log` instead of stdout.
        background: bool,
    },
    /// Every URL listed in a file, saved into a directory.
    Batch {
        /// The URL list.
        input_file: PathBuf,
        /// Where files are saved.
        download_dir: PathBuf,
    },
    /// A shallow mirror of one page.
    Mirror(MirrorJob),
}

/// Validated configuration for one invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Selected mode with its resolved parameters.
    pub mode: Mode,
}

impl RunConfig {
    /// Validates `options` and selects the mode.
    ///
    /// The rate limit is parsed only for single-file mode; batch and mirror
    /// transfers are never throttled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The download directory starts with `~` and no home directory is known
    /// - The rate limit is malformed (single-file mode)
    /// - The URL is malformed (single-file mode)
    pub fn resolve(options: &RunOptions) -> Result<Self, ConfigError> {
        let url = options
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let mode = match (&options.input_file, url) {
            (Some(input_file), _) => Mode::Batch {
                input_file: expand_home(input_file)?,
                download_dir: download_dir(options)?,
            },
            (None, Some(url)) if options.mirror => {
                let filter = MirrorFilter::new(
                    split_list(options.reject.as_deref()),
                    split_list(options.exclude_directories.as_deref()),
                );
                let status_check = if options.strict_status {
                    RootStatusCheck::Gate
                } else {
                    RootStatusCheck::Deferred
                };
                Mode::Mirror(
                    MirrorJob::new(url, download_dir(options)?, filter)
                        .with_status_check(status_check),
                )
            }
            (None, Some(url)) => {
                let rate_limit = options
                    .rate_limit
                    .as_deref()
                    .map(parse_rate_limit)
                    .transpose()?;
                let request = TransferRequest::resolve(
                    url,
                    options.output_document.as_deref(),
                    &download_dir(options)?,
                )
                .map_err(|source| ConfigError::InvalidUrl { source })?
                .with_rate_limit(rate_limit);
                Mode::Single {
                    request,
                    background: options.background,
                }
            }
            (None, None) => Mode::Usage,
        };

        debug!(?mode, "run mode resolved");
        Ok(Self { mode })
    }
}

fn download_dir(options: &RunOptions) -> Result<PathBuf, ConfigError> {
    let raw = options
        .directory_prefix
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .unwrap_or(DEFAULT_DOWNLOAD_DIR);
    expand_home(raw)
}

fn parse_rate_limit(value: &str) -> Result<RateLimit, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidRateLimit {
            value: value.to_string(),
            source,
        })
}

/// Replaces a leading `~` (alone or followed by a separator) with the home
/// directory. Other paths, including `~user`, are returned unchanged.
///
/// # Errors
///
/// Returns [`ConfigError::HomeDirectory`] if expansion is needed but the home
/// directory cannot be determined.
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(SEPARATORS) => rest.trim_start_matches(SEPARATORS),
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home::home_dir().ok_or_else(|| ConfigError::HomeDirectory {
        path: path.to_string(),
    })?;
    Ok(if rest.is_empty() {
        home
    } else {
        home.join(Path::new(rest))
    })
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}
