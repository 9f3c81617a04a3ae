//! Download progress reporting.
//!
//! Renders a single status line that is rewritten in place (`\r12.5%`) and
//! terminated with a newline once the download is complete.

use std::io::Write;
use std::time::Duration;

/// Download progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Total bytes to download, 0 when unknown.
    pub expected: u64,
}

impl DownloadProgress {
    #[must_use]
    pub const fn new(downloaded: u64, expected: u64) -> Self {
        Self {
            downloaded,
            expected,
        }
    }

    /// Returns the progress as a percentage, `None` when the size is unknown.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        if self.expected == 0 {
            return None;
        }
        Some(self.downloaded as f64 / self.expected as f64 * 100.0)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percentage().is_some_and(|pct| pct >= 100.0)
    }
}

/// Formats one status update: carriage return, percentage with one decimal,
/// and a newline when the download has completed.
#[must_use]
pub fn render_progress(progress: DownloadProgress) -> Option<String> {
    let pct = progress.percentage()?;
    let newline = if pct >= 100.0 { "\n" } else { "" };
    Some(format!("\r{pct:.1}%{newline}"))
}

/// Writes progress updates to a console, pausing after each one.
pub struct ProgressReporter<W: Write> {
    out: W,
    delay: Duration,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W, delay: Duration) -> Self {
        Self { out, delay }
    }

    /// Reports one update. Console write errors are ignored.
    pub fn report(&mut self, progress: DownloadProgress) {
        let Some(line) = render_progress(progress) else {
            return;
        };
        if self
            .out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.flush())
            .is_err()
        {
            tracing::debug!("Progress line could not be written");
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
