//! Byte-rate throttling for transfer output.
//!
//! This module provides [`RateLimit`], parsed from values such as `400k` or
//! `2M`, and [`RateLimitedWriter`], which wraps an async sink and paces writes
//! so that the average number of bytes written per second stays under the
//! configured ceiling.
//!
//! # Overview
//!
//! Pacing is a per-call leaky-bucket approximation: before writing `n` bytes
//! the writer computes `n / rate` seconds and sleeps for whatever part of that
//! has not already elapsed since the previous write. Bursts inside one call
//! are not smoothed, and one very large write stalls for its whole delay.
//!
//! # Example
//!
//! ```
//! use wget_core::download::{RateLimit, RateLimitedWriter};
//!
//! # async fn example() -> std::io::Result<()> {
//! let limit: RateLimit = "400k".parse().expect("valid rate");
//! assert_eq!(limit.bytes_per_second(), 409_600);
//!
//! let writer = RateLimitedWriter::new(Vec::new(), limit);
//! writer.write(b"hello").await?;
//! assert_eq!(writer.into_inner(), b"hello");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Errors produced when parsing a rate limit value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// The value was empty or whitespace only.
    #[error("empty rate limit")]
    Empty,

    /// The value did not end in one of `k`, `K`, `m`, `M`.
    #[error("invalid rate limit suffix: {suffix:?} (expected k or M)")]
    InvalidSuffix {
        /// The offending trailing character.
        suffix: char,
    },

    /// The numeric portion was not a non-negative integer.
    #[error("invalid rate limit number: {value:?}")]
    InvalidNumber {
        /// The numeric portion as written.
        value: String,
    },

    /// The rate resolved to zero bytes per second.
    #[error("rate limit must be greater than zero")]
    Zero,

    /// The rate does not fit in 64 bits once the suffix is applied.
    #[error("rate limit too large: {value}")]
    Overflow {
        /// The full value as written.
        value: String,
    },
}

/// A maximum average write rate, in bytes per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimit {
    bytes_per_second: NonZeroU64,
}

impl RateLimit {
    /// Creates a rate limit from a raw byte count; `None` for zero.
    #[must_use]
    pub fn from_bytes_per_second(bytes_per_second: u64) -> Option<Self> {
        NonZeroU64::new(bytes_per_second).map(|bytes_per_second| Self { bytes_per_second })
    }

    /// Maximum bytes per second.
    #[must_use]
    pub fn bytes_per_second(self) -> u64 {
        self.bytes_per_second.get()
    }

    /// Minimum time a write of `len` bytes must occupy at this rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn expected_delay(self, len: usize) -> Duration {
        Duration::from_secs_f64(len as f64 / self.bytes_per_second() as f64)
    }
}

impl FromStr for RateLimit {
    type Err = RateLimitError;

    /// Parses `<integer><suffix>` where the suffix is `k`/`K` (×1024) or `m`/`M` (×1024²).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        let Some(suffix) = value.chars().last() else {
            return Err(RateLimitError::Empty);
        };

        let multiplier = match suffix {
            'k' | 'K' => KIB,
            'm' | 'M' => MIB,
            other => return Err(RateLimitError::InvalidSuffix { suffix: other }),
        };

        let digits = &value[..value.len() - suffix.len_utf8()];
        // `u64::from_str` accepts a leading '+', which is not a plain integer here.
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RateLimitError::InvalidNumber {
                value: digits.to_string(),
            });
        }
        let count = digits
            .parse::<u64>()
            .map_err(|_| RateLimitError::Overflow {
                value: value.to_string(),
            })?;
        let bytes = count
            .checked_mul(multiplier)
            .ok_or_else(|| RateLimitError::Overflow {
                value: value.to_string(),
            })?;

        Self::from_bytes_per_second(bytes).ok_or(RateLimitError::Zero)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} B/s", self.bytes_per_second)
    }
}

/// Mutable pacing state. Only touched while the writer's lock is held.
#[derive(Debug)]
struct WriterState<W> {
    sink: W,
    last_write: Instant,
}

/// Async sink decorator that enforces a [`RateLimit`].
///
/// Every write takes `&self`: the pacing check, the sleep, the write to the
/// inner sink and the timestamp update all happen under one mutex, so a single
/// writer can be shared through `Arc` by several concurrent producers without
/// exceeding the rate in aggregate.
#[derive(Debug)]
pub struct RateLimitedWriter<W> {
    limit: RateLimit,
    state: Mutex<WriterState<W>>,
}

impl<W> RateLimitedWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps `sink`. The pacing clock starts now.
    #[must_use]
    pub fn new(sink: W, limit: RateLimit) -> Self {
        debug!(bytes_per_second = limit.bytes_per_second(), "creating rate limited writer");
        Self {
            limit,
            state: Mutex::new(WriterState {
                sink,
                last_write: Instant::now(),
            }),
        }
    }

    /// The configured ceiling.
    #[must_use]
    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Writes all of `buf`, first sleeping long enough to respect the rate.
    ///
    /// Returns the number of bytes written, which is always `buf.len()` on success.
    ///
    /// # Errors
    ///
    /// Returns the inner sink's error unchanged. Nothing is retried.
    #[instrument(level = "trace", skip(self, buf), fields(len = buf.len()))]
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().await;

        let expected = self.limit.expected_delay(buf.len());
        let elapsed = state.last_write.elapsed();
        if elapsed < expected {
            let pause = expected - elapsed;
            trace!(pause_us = pause.as_micros(), "throttling write");
            tokio::time::sleep(pause).await;
        }

        let result = state.sink.write_all(buf).await;
        state.last_write = Instant::now();
        result.map(|()| buf.len())
    }

    /// Flushes the inner sink.
    ///
    /// # Errors
    ///
    /// Returns the inner sink's flush error.
    pub async fn flush(&self) -> io::Result<()> {
        self.state.lock().await.sink.flush().await
    }

    /// Unwraps the inner sink.
    pub fn into_inner(self) -> W {
        self.state.into_inner().sink
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn limit(bytes_per_second: u64) -> RateLimit {
        RateLimit::from_bytes_per_second(bytes_per_second).unwrap()
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_kilobytes() {
        let parsed: RateLimit = "400k".parse().unwrap();
        assert_eq!(parsed.bytes_per_second(), 409_600);
    }

    #[test]
    fn test_parse_megabytes() {
        let parsed: RateLimit = "2M".parse().unwrap();
        assert_eq!(parsed.bytes_per_second(), 2_097_152);
    }

    #[test]
    fn test_parse_suffix_case_insensitive() {
        assert_eq!("1K".parse::<RateLimit>().unwrap().bytes_per_second(), 1024);
        assert_eq!(
            "1m".parse::<RateLimit>().unwrap().bytes_per_second(),
            1_048_576
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            "  8k \n".parse::<RateLimit>().unwrap().bytes_per_second(),
            8192
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!("".parse::<RateLimit>(), Err(RateLimitError::Empty));
        assert_eq!("   ".parse::<RateLimit>(), Err(RateLimitError::Empty));
    }

    #[test]
    fn test_parse_rejects_unknown_suffix() {
        assert_eq!(
            "400g".parse::<RateLimit>(),
            Err(RateLimitError::InvalidSuffix { suffix: 'g' })
        );
        // A bare number has no suffix at all.
        assert_eq!(
            "500".parse::<RateLimit>(),
            Err(RateLimitError::InvalidSuffix { suffix: '0' })
        );
    }

    #[test]
    fn test_parse_rejects_non_integer_number() {
        assert!(matches!(
            "1.5M".parse::<RateLimit>(),
            Err(RateLimitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "abck".parse::<RateLimit>(),
            Err(RateLimitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "k".parse::<RateLimit>(),
            Err(RateLimitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "-4k".parse::<RateLimit>(),
            Err(RateLimitError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "+4k".parse::<RateLimit>(),
            Err(RateLimitError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert_eq!("0k".parse::<RateLimit>(), Err(RateLimitError::Zero));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(matches!(
            "99999999999999999999M".parse::<RateLimit>(),
            Err(RateLimitError::Overflow { .. })
        ));
        assert!(matches!(
            "18014398509481984M".parse::<RateLimit>(),
            Err(RateLimitError::Overflow { .. })
        ));
    }

    #[test]
    fn test_expected_delay() {
        assert_eq!(limit(1024).expected_delay(512), Duration::from_millis(500));
        assert_eq!(limit(1024).expected_delay(0), Duration::ZERO);
    }

    // ==================== Writer Tests ====================

    #[tokio::test]
    async fn test_writer_passes_bytes_through() {
        let writer = RateLimitedWriter::new(Vec::new(), limit(1_048_576));
        assert_eq!(writer.write(b"abc").await.unwrap(), 3);
        assert_eq!(writer.write(b"def").await.unwrap(), 3);
        writer.flush().await.unwrap();
        assert_eq!(writer.into_inner(), b"abcdef");
    }

    #[tokio::test]
    async fn test_writer_paces_consecutive_writes() {
        tokio::time::pause();

        let writer = RateLimitedWriter::new(Vec::new(), limit(1024));
        let start = Instant::now();

        writer.write(&[0u8; 512]).await.unwrap();
        writer.write(&[0u8; 512]).await.unwrap();

        // 1024 bytes at 1024 B/s
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_writer_large_single_write_stalls_for_whole_delay() {
        tokio::time::pause();

        let writer = RateLimitedWriter::new(Vec::new(), limit(1024));
        let start = Instant::now();

        writer.write(&[0u8; 4096]).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_writer_idle_time_counts_toward_delay() {
        tokio::time::pause();

        let writer = RateLimitedWriter::new(Vec::new(), limit(1024));
        tokio::time::advance(Duration::from_secs(2)).await;

        let start = Instant::now();
        writer.write(&[0u8; 1024]).await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_writer_shared_between_tasks_respects_rate() {
        tokio::time::pause();

        let writer = Arc::new(RateLimitedWriter::new(Vec::new(), limit(1024)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let writer = Arc::clone(&writer);
            handles.push(tokio::spawn(async move {
                writer.write(&[7u8; 256]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_secs(1));
        let writer = Arc::try_unwrap(writer).unwrap();
        assert_eq!(writer.into_inner().len(), 1024);
    }

    #[test]
    fn test_writer_propagates_sink_error() {
        struct FailingSink;

        impl AsyncWrite for FailingSink {
            fn poll_write(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &[u8],
            ) -> std::task::Poll<io::Result<usize>> {
                std::task::Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full")))
            }

            fn poll_flush(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }

            fn poll_shutdown(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }
        }

        let writer = RateLimitedWriter::new(FailingSink, limit(1_048_576));
        let err = tokio_test::block_on(writer.write(b"x")).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
