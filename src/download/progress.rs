//! Progress accounting and the textual progress line.

use chrono::{DateTime, Local};
use tokio::time::Instant;

use super::constants::{BYTES_PER_MB, PROGRESS_BAR_WIDTH, PROGRESS_INTERVAL};

/// Running totals for one transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Bytes written to the destination so far. Never decreases.
    pub bytes_transferred: u64,
    /// Expected body size, when the server announced one.
    pub total_bytes: Option<u64>,
    /// Wall-clock start of the transfer.
    pub started_at: DateTime<Local>,
}

impl TransferProgress {
    /// Starts tracking a transfer of `total_bytes` (if known) at the current time.
    #[must_use]
    pub fn start(total_bytes: Option<u64>) -> Self {
        Self {
            bytes_transferred: 0,
            total_bytes,
            started_at: Local::now(),
        }
    }

    /// Adds `len` freshly written bytes.
    pub fn advance(&mut self, len: usize) {
        self.bytes_transferred = self.bytes_transferred.saturating_add(len as u64);
    }

    /// Completion percentage in `0.0..=100.0`.
    ///
    /// Without a usable total (unknown, or zero) the transfer reads as 0 % while
    /// running and 100 % once `finished`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, finished: bool) -> f64 {
        match self.total_bytes {
            Some(total) if total > 0 => {
                (self.bytes_transferred as f64 / total as f64 * 100.0).min(100.0)
            }
            _ if finished => 100.0,
            _ => 0.0,
        }
    }

    /// Renders `42.00% [1.23MB / 2.93MB] [================                        ]`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn render(&self, finished: bool) -> String {
        let percent = self.percent(finished);
        let transferred_mb = self.bytes_transferred as f64 / BYTES_PER_MB;
        let total_mb = match self.total_bytes {
            Some(total) => format!("{:.2}MB", total as f64 / BYTES_PER_MB),
            None => "?MB".to_string(),
        };

        let filled = ((PROGRESS_BAR_WIDTH as f64) * percent / 100.0) as usize;
        let filled = filled.min(PROGRESS_BAR_WIDTH);
        let bar = format!(
            "{}{}",
            "=".repeat(filled),
            " ".repeat(PROGRESS_BAR_WIDTH - filled)
        );

        format!("{percent:.2}% [{transferred_mb:.2}MB / {total_mb}] [{bar}]")
    }
}

/// Decides when the next progress line is due.
#[derive(Debug, Default)]
pub(crate) struct ProgressThrottle {
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    /// True for the first call and then at most once per [`PROGRESS_INTERVAL`].
    pub(crate) fn should_emit(&mut self) -> bool {
        let now = Instant::now();
        let due = self
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= PROGRESS_INTERVAL);
        if due {
            self.last_emit = Some(now);
        }
        due
    }
}
