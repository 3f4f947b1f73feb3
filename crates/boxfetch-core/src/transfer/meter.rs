//! Throughput and progress accounting for one transfer.

use std::time::{Duration, Instant};

/// Progress reported once the link is ready; streaming progress starts here.
pub const STREAM_PROGRESS_FLOOR: u8 = 10;
/// Streaming never reports completion; 100 is reserved for the completed job.
pub const STREAM_PROGRESS_CEILING: u8 = 99;

#[derive(Debug, Clone)]
pub struct TransferMeter {
    started: Instant,
    last_flush: Instant,
    interval: Duration,
    received: u64,
    total: Option<u64>,
}

impl TransferMeter {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_flush: now,
            interval,
            received: 0,
            total: None,
        }
    }

    /// Expected size, when the server announced one.
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total.filter(|t| *t > 0);
    }

    pub fn record(&mut self, bytes: usize) {
        self.received += bytes as u64;
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Average throughput since the start.
    pub fn bytes_per_sec(&self, now: Instant) -> i64 {
        let secs = now
            .saturating_duration_since(self.started)
            .as_secs_f64()
            .max(0.001);
        (self.received as f64 / secs) as i64
    }

    /// `10 + floor(fraction * 89)`, capped at 99; None when the size is unknown.
    pub fn progress(&self) -> Option<u8> {
        let total = self.total?;
        let fraction = (self.received as f64 / total as f64).min(1.0);
        let value = STREAM_PROGRESS_FLOOR as f64 + (fraction * 89.0).floor();
        Some((value as u8).min(STREAM_PROGRESS_CEILING))
    }

    /// True (and restarts the interval) when more than `interval` passed since the last flush.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_flush) > self.interval {
            self.last_flush = now;
            true
        } else {
            false
        }
    }
}
