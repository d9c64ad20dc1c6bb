//! Transfer progress derivation: rate, ETA, and percent complete

use std::collections::VecDeque;
use std::time::Instant;

const RATE_SAMPLE_WINDOW: usize = 10;

/// Tracks bytes/chunks transferred and derives a smoothed transfer rate,
/// estimated time remaining, and completion percentage.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    file_size: u64,
    total_chunks: u32,
    bytes_transferred: u64,
    chunks_transferred: u32,
    samples: VecDeque<f64>,
    last_sample_at: Instant,
    last_sample_bytes: u64,
}

impl TransferProgress {
    /// A fresh tracker for a transfer of `file_size` bytes split into
    /// `total_chunks` chunks.
    pub fn new(file_size: u64, total_chunks: u32) -> Self {
        Self {
            file_size,
            total_chunks,
            bytes_transferred: 0,
            chunks_transferred: 0,
            samples: VecDeque::with_capacity(RATE_SAMPLE_WINDOW),
            last_sample_at: Instant::now(),
            last_sample_bytes: 0,
        }
    }

    /// Record that `bytes_transferred`/`chunks_transferred` have reached
    /// these cumulative totals, taking one rate sample from the elapsed
    /// time since the previous call.
    pub fn record(&mut self, bytes_transferred: u64, chunks_transferred: u32) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_sample_at).as_secs_f64();
        if elapsed > 0.0 {
            let delta_bytes = bytes_transferred.saturating_sub(self.last_sample_bytes) as f64;
            let mbps = (delta_bytes / elapsed) * 8.0 / (1024.0 * 1024.0);
            if self.samples.len() == RATE_SAMPLE_WINDOW {
                self.samples.pop_front();
            }
            self.samples.push_back(mbps);
            self.last_sample_at = now;
            self.last_sample_bytes = bytes_transferred;
        }

        self.bytes_transferred = bytes_transferred;
        self.chunks_transferred = chunks_transferred;
    }

    /// Mean of the last (up to 10) per-interval rate samples, in Mbps.
    pub fn transfer_rate_mbps(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Estimated seconds remaining at the current smoothed rate, or `0` if
    /// the rate is not yet known.
    pub fn eta_seconds(&self) -> u64 {
        let rate_mbps = self.transfer_rate_mbps();
        if rate_mbps <= 0.0 {
            return 0;
        }
        let remaining_bytes = self.file_size.saturating_sub(self.bytes_transferred) as f64;
        let bytes_per_second = rate_mbps * 1024.0 * 1024.0 / 8.0;
        (remaining_bytes / bytes_per_second).ceil() as u64
    }

    /// `chunks_transferred / total_chunks * 100`.
    pub fn progress_percent(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        (self.chunks_transferred as f64 / self.total_chunks as f64) * 100.0
    }

    /// Cumulative bytes transferred as of the last [`Self::record`] call.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_has_zero_progress() {
        let progress = TransferProgress::new(1000, 10);
        assert_eq!(progress.progress_percent(), 0.0);
        assert_eq!(progress.eta_seconds(), 0);
    }

    #[test]
    fn progress_percent_is_chunks_over_total() {
        let mut progress = TransferProgress::new(1000, 10);
        progress.record(500, 5);
        assert_eq!(progress.progress_percent(), 50.0);
    }

    #[test]
    fn complete_transfer_is_100_percent() {
        let mut progress = TransferProgress::new(1000, 10);
        progress.record(1000, 10);
        assert_eq!(progress.progress_percent(), 100.0);
    }

    #[test]
    fn rate_sample_window_caps_at_ten() {
        let mut progress = TransferProgress::new(1_000_000, 100);
        for i in 1..=15u64 {
            progress.record(i * 1000, i as u32);
        }
        assert!(progress.samples.len() <= 10);
    }
}
