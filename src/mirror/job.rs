//! Mirror job orchestration.
//!
//! One job fetches a single page, materializes the directories its references
//! imply, pulls every accepted reference through the transfer engine and saves
//! the page with those references rewritten to site-relative paths.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use super::domain::site_directory_name;
use super::error::MirrorError;
use super::filter::{FilterDecision, MirrorFilter};
use super::links::extract_links;
use crate::download::filename::{DEFAULT_INDEX_NAME, relative_asset_path};
use crate::download::{DownloadError, HttpClient, TransferLog, TransferRequest};

/// Progress of a mirror job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStage {
    /// Nothing done yet.
    Start,
    /// The site directory exists.
    SiteDirCreated,
    /// The root page body is in memory.
    PageFetched,
    /// References and implied directories are known.
    LinksExtracted,
    /// Accepted directories exist on disk.
    DirsMaterialized,
    /// Every accepted reference was attempted.
    AssetsDownloaded,
    /// The rewritten page was saved.
    IndexWritten,
    /// Finished successfully.
    Done,
    /// Ended by an error.
    Failed,
}

impl MirrorStage {
    /// Returns the snake_case name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SiteDirCreated => "site_dir_created",
            Self::PageFetched => "page_fetched",
            Self::LinksExtracted => "links_extracted",
            Self::DirsMaterialized => "dirs_materialized",
            Self::AssetsDownloaded => "assets_downloaded",
            Self::IndexWritten => "index_written",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for MirrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When the root page's HTTP status is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RootStatusCheck {
    /// After assets and the index are written. The page body is mirrored
    /// whatever its status, then a non-2xx status is reported.
    #[default]
    Deferred,
    /// Right after the fetch. A non-2xx root aborts before any asset or index
    /// work.
    Gate,
}

/// What one mirror job produced.
#[derive(Debug, Default)]
pub struct MirrorReport {
    /// `<download dir>/<domain>`.
    pub site_directory: PathBuf,
    /// The saved page.
    pub index_path: PathBuf,
    /// References that were saved.
    pub downloaded: Vec<String>,
    /// References whose transfer failed.
    pub failed: Vec<(String, DownloadError)>,
    /// References skipped by the filter, once per occurrence.
    pub rejected: Vec<(String, FilterDecision)>,
    /// References that would resolve outside the site directory.
    pub skipped: Vec<String>,
}

/// One shallow mirror of a page and its directly referenced assets.
#[derive(Debug, Clone)]
pub struct MirrorJob {
    /// Page to mirror.
    pub root_url: String,
    /// Directory the site directory is created in.
    pub download_dir: PathBuf,
    /// Reject and exclude rules.
    pub filter: MirrorFilter,
    /// Root status check order.
    pub status_check: RootStatusCheck,
}

impl MirrorJob {
    /// Creates a job with the default [`RootStatusCheck::Deferred`] order.
    #[must_use]
    pub fn new(
        root_url: impl Into<String>,
        download_dir: impl Into<PathBuf>,
        filter: MirrorFilter,
    ) -> Self {
        Self {
            root_url: root_url.into(),
            download_dir: download_dir.into(),
            filter,
            status_check: RootStatusCheck::default(),
        }
    }

    /// Same job with an explicit status check order.
    #[must_use]
    pub fn with_status_check(mut self, status_check: RootStatusCheck) -> Self {
        self.status_check = status_check;
        self
    }

    /// `<download dir>/<domain>` for this job's root URL.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Domain`] if the URL has no host-like token.
    pub fn site_directory(&self) -> Result<PathBuf, MirrorError> {
        Ok(self.download_dir.join(site_directory_name(&self.root_url)?))
    }

    /// Runs the job to completion.
    ///
    /// Asset failures are reported through `log` and collected in the report;
    /// they never end the job.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError` if:
    /// - No domain can be taken from the root URL
    /// - The site directory or an implied directory cannot be created
    /// - The root page cannot be fetched
    /// - The index cannot be written
    /// - The root page answered with a non-2xx status
    #[instrument(skip(self, client, log), fields(url = %self.root_url, check = ?self.status_check))]
    pub async fn run(
        &self,
        client: &HttpClient,
        log: &mut TransferLog,
    ) -> Result<MirrorReport, MirrorError> {
        let result = self.run_inner(client, log).await;
        match &result {
            Ok(report) => {
                enter(MirrorStage::Done);
                info!(
                    site = %report.site_directory.display(),
                    downloaded = report.downloaded.len(),
                    failed = report.failed.len(),
                    rejected = report.rejected.len(),
                    "mirror complete"
                );
            }
            Err(error) => {
                match error.status_line() {
                    Some(status_line) => log.line(status_line),
                    None => log.line(format_args!("Error: {error}")),
                }
                enter(MirrorStage::Failed);
                warn!(error = %error, stage = %error.stage(), "mirror failed");
            }
        }
        result
    }

    async fn run_inner(
        &self,
        client: &HttpClient,
        log: &mut TransferLog,
    ) -> Result<MirrorReport, MirrorError> {
        log.line(format_args!("Mirroring website: {}", self.root_url));
        enter(MirrorStage::Start);

        let site_directory = self.site_directory()?;
        tokio::fs::create_dir_all(&site_directory)
            .await
            .map_err(|e| MirrorError::site_directory(&site_directory, e))?;
        enter(MirrorStage::SiteDirCreated);

        let page = client
            .fetch_page(&self.root_url)
            .await
            .map_err(MirrorError::fetch)?;
        enter(MirrorStage::PageFetched);

        let root_ok = page.is_success();
        let root_status = page.status;
        if self.status_check == RootStatusCheck::Gate && !root_ok {
            return Err(MirrorError::root_status(
                &self.root_url,
                root_status,
                MirrorStage::PageFetched,
            ));
        }

        let links = extract_links(&page.body);
        enter(MirrorStage::LinksExtracted);

        for directory in &links.implied_directories {
            if !self.screen(directory, log).is_accepted() {
                continue;
            }
            let Some(relative) = relative_asset_path(directory) else {
                debug!(directory = %directory, "directory outside site skipped");
                continue;
            };
            let path = site_directory.join(relative);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| MirrorError::create_directory(&path, e))?;
        }
        enter(MirrorStage::DirsMaterialized);

        let mut report = MirrorReport {
            site_directory: site_directory.clone(),
            index_path: site_directory.join(DEFAULT_INDEX_NAME),
            ..MirrorReport::default()
        };
        let mut html = page.body;
        let mut seen = HashSet::new();

        for reference in &links.references {
            let decision = self.screen(reference, log);
            if !decision.is_accepted() {
                report.rejected.push((reference.clone(), decision));
                continue;
            }
            if !seen.insert(reference.as_str()) {
                continue;
            }
            let Some(relative) = relative_asset_path(reference) else {
                log.line(format_args!("Skipped path outside site: {reference}"));
                report.skipped.push(reference.clone());
                continue;
            };

            log.line(format_args!("Downloading file: {reference}"));
            let request = TransferRequest {
                url: join_reference(&self.root_url, reference),
                destination: site_directory.join(relative),
                rate_limit: None,
            };
            match client.transfer(&request, log).await {
                Ok(_) => report.downloaded.push(reference.clone()),
                Err(error) => report.failed.push((reference.clone(), error)),
            }

            html = rewrite_reference(&html, reference);
        }
        enter(MirrorStage::AssetsDownloaded);

        tokio::fs::write(&report.index_path, html.as_bytes())
            .await
            .map_err(|e| MirrorError::write_index(&report.index_path, e))?;
        enter(MirrorStage::IndexWritten);

        if !root_ok {
            return Err(MirrorError::root_status(
                &self.root_url,
                root_status,
                MirrorStage::IndexWritten,
            ));
        }

        Ok(report)
    }

    /// Applies the filter and reports a skip.
    fn screen(&self, candidate: &str, log: &mut TransferLog) -> FilterDecision {
        let decision = self.filter.check(candidate);
        match &decision {
            FilterDecision::Accept => {}
            FilterDecision::RejectedSuffix(_) => {
                log.line(format_args!("Rejected due to suffix: {candidate}"));
            }
            FilterDecision::ExcludedPath(_) => {
                log.line(format_args!("Excluded path: {candidate}"));
            }
        }
        decision
    }
}

fn enter(stage: MirrorStage) {
    debug!(stage = %stage, "mirror stage");
}

/// Appends `reference` to `root` with exactly one `/` between them.
fn join_reference(root: &str, reference: &str) -> String {
    match (root.ends_with('/'), reference.strip_prefix('/')) {
        (true, Some(rest)) => format!("{root}{rest}"),
        (false, None) => format!("{root}/{reference}"),
        _ => format!("{root}{reference}"),
    }
}

/// Points quoted occurrences of `reference` at its site-relative form.
///
/// Only quote-delimited matches change, the same quoting the link extractor
/// accepts, so `/a.png` leaves `"/img/a.png"` alone.
fn rewrite_reference(html: &str, reference: &str) -> String {
    const QUOTES: [char; 2] = ['"', '\''];
    let local = reference.trim_start_matches('/');
    let mut html = html.to_owned();
    for open in QUOTES {
        for close in QUOTES {
            html = html.replace(
                &format!("{open}{reference}{close}"),
                &format!("{open}{local}{close}"),
            );
        }
    }
    html
}
