//! Windowed rate measurement for frames and ticks.

use std::time::Duration;

/// Counts events over a rolling window and publishes the rate once the window fills.
#[derive(Clone, Debug)]
pub(crate) struct RateCounter {
    window: Duration,
    elapsed: Duration,
    count: u64,
    rate: f64,
}

impl RateCounter {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            elapsed: Duration::ZERO,
            count: 0,
            rate: 0.0,
        }
    }

    pub(crate) fn record(&mut self, delta: Duration, count: u64) {
        self.elapsed = self.elapsed.saturating_add(delta);
        self.count = self.count.saturating_add(count);
        if self.elapsed < self.window {
            return;
        }

        let seconds = self.elapsed.as_secs_f64();
        if seconds > f64::EPSILON {
            self.rate = self.count as f64 / seconds;
        }
        self.elapsed = Duration::ZERO;
        self.count = 0;
    }

    pub(crate) fn rate(&self) -> f64 {
        self.rate
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.count = 0;
        self.rate = 0.0;
    }
}
