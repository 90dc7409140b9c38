//! Constants for the download module (buffering, progress cadence, timeouts).

use std::time::Duration;

/// Size of each write issued to the destination sink.
pub const TRANSFER_CHUNK_SIZE: usize = 1024;

/// Minimum interval between two progress lines of one transfer.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Width of the textual progress bar, in columns.
pub const PROGRESS_BAR_WIDTH: usize = 40;

/// TCP connect timeout (30 seconds). Requests and body reads have no deadline.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Bytes per mebibyte, used for every MB figure printed to the transfer log.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
