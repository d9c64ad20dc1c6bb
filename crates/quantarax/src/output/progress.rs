//! Progress bar for transfers

use indicatif::{ProgressBar, ProgressStyle};

/// Transfer progress bar wrapper
pub struct TransferProgressBar {
    bar: ProgressBar,
}

impl TransferProgressBar {
    /// Create a new progress bar sized to `total_bytes`.
    pub fn new(total_bytes: u64) -> Self {
        let bar = ProgressBar::new(total_bytes);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, eta {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Advance the bar to an absolute byte count transferred so far.
    pub fn update(&mut self, bytes_transferred: u64) {
        self.bar.set_position(bytes_transferred);
    }

    /// Finish and clear the bar from the terminal.
    pub fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}
