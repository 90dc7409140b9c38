//! Shallow website mirroring.
//!
//! A mirror job fetches one page, scans it for `src`/`href`/`url()` references,
//! recreates the directories those references imply under
//! `<download dir>/<domain>`, saves each accepted reference through the
//! transfer engine and writes the page as `index.html` with the saved
//! references rewritten to site-relative paths.
//!
//! # Example
//!
//! ```no_run
//! use wget_core::download::{HttpClient, TransferLog};
//! use wget_core::mirror::{MirrorFilter, MirrorJob};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let filter = MirrorFilter::new([".gif"], ["/private"]);
//! let report = MirrorJob::new("https://example.com/", ".", filter)
//!     .run(&client, &mut TransferLog::stdout())
//!     .await?;
//! println!("{} assets saved", report.downloaded.len());
//! # Ok(())
//! # }
//! ```

mod domain;
mod error;
mod filter;
mod job;
mod links;

pub use domain::site_directory_name;
pub use error::MirrorError;
pub use filter::{FilterDecision, MirrorFilter};
pub use job::{MirrorJob, MirrorReport, MirrorStage, RootStatusCheck};
pub use links::{LinkSet, extract_links};
