//! Adaptive FEC controller and bandwidth/chunk-size autotuner (C11).

use std::time::{Duration, Instant};

use quantarax_protocol::wire::messages::FecUpdateMessage;

const MIN_CHUNK_BYTES: u32 = 256 * 1024;
const MAX_CHUNK_BYTES: u32 = 8 * 1024 * 1024;
const PROBE_DURATION: Duration = Duration::from_secs(5);
const PROBE_CHUNK_BYTES: u32 = 256 * 1024;
const PROBE_STREAMS: usize = 8;
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Tracks send/loss counters for one session and proposes Reed-Solomon
/// parameter changes as the loss ratio moves.
pub struct FecController {
    session_id: String,
    sent: u64,
    lost: u64,
    k: usize,
    r: usize,
}

impl FecController {
    pub fn new(session_id: String, k: usize, r: usize) -> Self {
        Self { session_id, sent: 0, lost: 0, k, r }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn r(&self) -> usize {
        self.r
    }

    pub fn record_sent(&mut self, n: u64) {
        self.sent += n;
    }

    pub fn record_lost(&mut self, n: u64) {
        self.lost += n;
    }

    fn loss_ratio(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.lost as f64 / self.sent as f64
        }
    }

    /// Evaluate the current loss ratio and return a `FEC_UPDATE` if `r`
    /// changed.
    pub fn tick(&mut self, now_unix: u64) -> Option<FecUpdateMessage> {
        let p = self.loss_ratio();
        let (new_r, reason) = if p > 0.10 && self.r < 12 {
            (self.r + 2, "loss>10%")
        } else if p > 0.03 && self.r < 8 {
            (self.r + 1, "loss>3%")
        } else if p < 0.01 && self.r > 2 {
            (self.r - 1, "loss<1%")
        } else {
            return None;
        };

        self.r = new_r;
        Some(FecUpdateMessage {
            session_id: self.session_id.clone(),
            k: self.k,
            r: self.r,
            reason: reason.to_string(),
            timestamp: now_unix,
        })
    }
}

/// A proposed change to stream count and per-stream chunk size, and how the
/// orchestrator should split its worker pools in response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunerAdjustment {
    pub chunk_bytes: u32,
    pub total_streams: usize,
    pub p1_streams: usize,
    pub p2_streams: usize,
}

fn split_streams(total: usize) -> (usize, usize) {
    // Preview (P1) gets a quarter of the pool, rounded up, at least one, so
    // header/preview chunks aren't starved by a fully saturated bulk pool.
    let p1 = ((total + 3) / 4).max(1).min(total);
    (p1, total - p1)
}

fn choose_stream_count(bandwidth_mbps: f64) -> usize {
    if bandwidth_mbps >= 200.0 {
        16
    } else if bandwidth_mbps >= 80.0 {
        12
    } else {
        8
    }
}

fn clamp_chunk_bytes(bytes: u64) -> u32 {
    let clamped = bytes.clamp(MIN_CHUNK_BYTES as u64, MAX_CHUNK_BYTES as u64);
    let rounded = (clamped as f64 / MIN_CHUNK_BYTES as f64).ceil() as u64 * MIN_CHUNK_BYTES as u64;
    rounded.min(MAX_CHUNK_BYTES as u64) as u32
}

/// Bandwidth-delay-product-driven stream count and chunk-size tuner.
pub struct Autotuner {
    started_at: Instant,
    last_tick: Instant,
    current: TunerAdjustment,
}

impl Autotuner {
    pub fn new(now: Instant) -> Self {
        let (p1, p2) = split_streams(PROBE_STREAMS);
        Self {
            started_at: now,
            last_tick: now,
            current: TunerAdjustment {
                chunk_bytes: PROBE_CHUNK_BYTES,
                total_streams: PROBE_STREAMS,
                p1_streams: p1,
                p2_streams: p2,
            },
        }
    }

    pub fn current(&self) -> TunerAdjustment {
        self.current
    }

    /// Reassess streams/chunk size given the latest bandwidth estimate
    /// (Mbps) and RTT. Returns `None` during the initial probe phase or
    /// before the next 5s tick is due, or if nothing changed.
    pub fn tick(&mut self, now: Instant, bandwidth_mbps: f64, rtt: Duration) -> Option<TunerAdjustment> {
        if now.duration_since(self.started_at) < PROBE_DURATION {
            return None;
        }
        if now.duration_since(self.last_tick) < TICK_INTERVAL {
            return None;
        }
        self.last_tick = now;

        let total_streams = choose_stream_count(bandwidth_mbps);
        let bdp_bytes = (bandwidth_mbps * 1_000_000.0 / 8.0) * rtt.as_secs_f64();
        let per_stream_bytes = (bdp_bytes / total_streams as f64).max(0.0) as u64;
        let chunk_bytes = clamp_chunk_bytes(per_stream_bytes);
        let (p1_streams, p2_streams) = split_streams(total_streams);

        let next = TunerAdjustment { chunk_bytes, total_streams, p1_streams, p2_streams };
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fec_controller_raises_r_on_high_loss() {
        let mut controller = FecController::new("s1".into(), 10, 2);
        controller.record_sent(100);
        controller.record_lost(15);
        let update = controller.tick(0).unwrap();
        assert_eq!(update.r, 4);
        assert_eq!(update.reason, "loss>10%");
    }

    #[test]
    fn fec_controller_raises_r_moderately_on_mid_loss() {
        let mut controller = FecController::new("s1".into(), 10, 2);
        controller.record_sent(100);
        controller.record_lost(5);
        let update = controller.tick(0).unwrap();
        assert_eq!(update.r, 3);
        assert_eq!(update.reason, "loss>3%");
    }

    #[test]
    fn fec_controller_lowers_r_on_low_loss() {
        let mut controller = FecController::new("s1".into(), 10, 4);
        controller.record_sent(1000);
        controller.record_lost(1);
        let update = controller.tick(0).unwrap();
        assert_eq!(update.r, 3);
        assert_eq!(update.reason, "loss<1%");
    }

    #[test]
    fn fec_controller_stays_silent_in_steady_band() {
        let mut controller = FecController::new("s1".into(), 10, 4);
        controller.record_sent(100);
        controller.record_lost(2);
        assert!(controller.tick(0).is_none());
    }

    #[test]
    fn fec_controller_respects_r_ceiling_and_floor() {
        let mut controller = FecController::new("s1".into(), 10, 12);
        controller.record_sent(10);
        controller.record_lost(9);
        assert!(controller.tick(0).is_none());

        let mut controller = FecController::new("s1".into(), 10, 2);
        controller.record_sent(1000);
        controller.record_lost(0);
        assert!(controller.tick(0).is_none());
    }

    #[test]
    fn autotuner_stays_in_probe_phase_until_five_seconds() {
        let start = Instant::now();
        let mut tuner = Autotuner::new(start);
        assert_eq!(tuner.current().chunk_bytes, PROBE_CHUNK_BYTES);
        assert_eq!(tuner.current().total_streams, PROBE_STREAMS);
        assert!(tuner.tick(start + Duration::from_secs(1), 500.0, Duration::from_millis(50)).is_none());
    }

    #[test]
    fn autotuner_picks_high_stream_count_for_fast_links() {
        let start = Instant::now();
        let mut tuner = Autotuner::new(start);
        let adj = tuner
            .tick(start + Duration::from_secs(6), 250.0, Duration::from_millis(40))
            .unwrap();
        assert_eq!(adj.total_streams, 16);
        assert!(adj.chunk_bytes >= MIN_CHUNK_BYTES && adj.chunk_bytes <= MAX_CHUNK_BYTES);
        assert_eq!(adj.chunk_bytes % MIN_CHUNK_BYTES, 0);
        assert_eq!(adj.p1_streams + adj.p2_streams, adj.total_streams);
    }

    #[test]
    fn autotuner_picks_mid_and_low_stream_counts() {
        assert_eq!(choose_stream_count(100.0), 12);
        assert_eq!(choose_stream_count(10.0), 8);
    }

    #[test]
    fn clamp_rounds_up_to_256kib_multiples() {
        assert_eq!(clamp_chunk_bytes(1), MIN_CHUNK_BYTES);
        assert_eq!(clamp_chunk_bytes(MIN_CHUNK_BYTES as u64 + 1), MIN_CHUNK_BYTES * 2);
        assert_eq!(clamp_chunk_bytes(u64::MAX), MAX_CHUNK_BYTES);
    }
}
