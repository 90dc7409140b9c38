//! Destination for user-facing transfer output.
//!
//! A [`TransferLog`] is passed explicitly to every transfer, batch and mirror
//! operation. Background mode hands them a log backed by `wget-log`; nothing
//! in this crate rebinds the process's stdout or stderr.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// File name used by background mode.
pub const BACKGROUND_LOG_FILE: &str = "wget-log";

/// Line-oriented sink for status lines and progress bars.
///
/// Write failures on the log are swallowed: losing a status line must never
/// abort the transfer it describes.
pub struct TransferLog {
    out: Box<dyn Write + Send>,
    captured: Option<SharedBuffer>,
    progress_open: bool,
}

impl std::fmt::Debug for TransferLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferLog")
            .field("captured", &self.captured.is_some())
            .field("progress_open", &self.progress_open)
            .finish_non_exhaustive()
    }
}

impl TransferLog {
    /// Log that writes to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Log that creates (or truncates) `path` and writes there.
    ///
    /// # Errors
    ///
    /// Returns the error from creating the file.
    pub fn create(path: &Path) -> io::Result<Self> {
        File::create(path).map(Self::from_writer)
    }

    /// Log over an arbitrary writer.
    #[must_use]
    pub fn from_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            captured: None,
            progress_open: false,
        }
    }

    /// In-memory log whose text can be read back with [`contents`](Self::contents).
    #[must_use]
    pub fn capture() -> Self {
        let buffer = SharedBuffer::default();
        Self {
            out: Box::new(buffer.clone()),
            captured: Some(buffer),
            progress_open: false,
        }
    }

    /// Everything written so far, for logs built with [`capture`](Self::capture).
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.captured.as_ref().map(SharedBuffer::text)
    }

    /// Writes one full line, closing an in-place progress line first.
    pub fn line(&mut self, message: impl Display) {
        self.close_progress();
        let _ = writeln!(self.out, "{message}");
        let _ = self.out.flush();
    }

    /// Redraws the in-place progress line.
    pub fn progress(&mut self, rendered: &str) {
        let _ = write!(self.out, "\r{rendered}");
        let _ = self.out.flush();
        self.progress_open = true;
    }

    fn close_progress(&mut self) {
        if self.progress_open {
            let _ = writeln!(self.out);
            self.progress_open = false;
        }
    }
}

impl Drop for TransferLog {
    fn drop(&mut self) {
        self.close_progress();
        let _ = self.out.flush();
    }
}

#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
