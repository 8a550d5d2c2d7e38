//! Tunables of the simulation clock.

use std::{num::NonZeroU32, time::Duration};

/// Slowest accepted game speed multiplier.
pub const MIN_GAME_SPEED: f64 = 0.1;

/// Fastest accepted game speed multiplier.
pub const MAX_GAME_SPEED: f64 = 5.0;

const DEFAULT_TICK_RATE: u32 = 30;
const DEFAULT_MAX_TICKS_PER_FRAME: u32 = 30;
const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(1);

/// Configuration parameters that tune the simulation clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    tick_rate: NonZeroU32,
    game_speed: f64,
    max_ticks_per_frame: NonZeroU32,
    stats_window: Duration,
}

impl ClockConfig {
    /// Creates a configuration running `tick_rate` logic ticks per simulated second.
    #[must_use]
    pub fn new(tick_rate: NonZeroU32) -> Self {
        Self {
            tick_rate,
            ..Self::default()
        }
    }

    /// Sets the initial game speed; clamped when the clock is built.
    #[must_use]
    pub fn with_game_speed(mut self, game_speed: f64) -> Self {
        self.game_speed = game_speed;
        self
    }

    /// Caps the number of catch-up ticks executed in one frame.
    #[must_use]
    pub fn with_max_ticks_per_frame(mut self, max_ticks_per_frame: NonZeroU32) -> Self {
        self.max_ticks_per_frame = max_ticks_per_frame;
        self
    }

    /// Sets the window over which fps and tps are measured.
    #[must_use]
    pub fn with_stats_window(mut self, stats_window: Duration) -> Self {
        self.stats_window = stats_window;
        self
    }

    /// Logic ticks per simulated second.
    #[must_use]
    pub const fn tick_rate(&self) -> NonZeroU32 {
        self.tick_rate
    }

    /// Fixed duration of one logic tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.get()
    }

    /// Initial game speed multiplier.
    #[must_use]
    pub const fn game_speed(&self) -> f64 {
        self.game_speed
    }

    /// Most catch-up ticks executed in one frame.
    #[must_use]
    pub const fn max_ticks_per_frame(&self) -> NonZeroU32 {
        self.max_ticks_per_frame
    }

    /// Window over which fps and tps are measured.
    #[must_use]
    pub const fn stats_window(&self) -> Duration {
        self.stats_window
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate: NonZeroU32::new(DEFAULT_TICK_RATE).unwrap_or(NonZeroU32::MIN),
            game_speed: 1.0,
            max_ticks_per_frame: NonZeroU32::new(DEFAULT_MAX_TICKS_PER_FRAME)
                .unwrap_or(NonZeroU32::MIN),
            stats_window: DEFAULT_STATS_WINDOW,
        }
    }
}

/// Clamps a requested game speed into the accepted range.
///
/// Non-finite requests yield `None`.
#[must_use]
pub fn clamp_game_speed(speed: f64) -> Option<f64> {
    speed
        .is_finite()
        .then(|| speed.clamp(MIN_GAME_SPEED, MAX_GAME_SPEED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_thirty_ticks_per_second() {
        let config = ClockConfig::default();
        assert_eq!(config.tick_rate().get(), 30);
        assert_eq!(config.tick_interval(), Duration::from_nanos(33_333_333));
        assert_eq!(config.max_ticks_per_frame().get(), 30);
        assert_eq!(config.game_speed(), 1.0);
    }

    #[test]
    fn speed_requests_are_clamped() {
        assert_eq!(clamp_game_speed(10.0), Some(MAX_GAME_SPEED));
        assert_eq!(clamp_game_speed(0.0), Some(MIN_GAME_SPEED));
        assert_eq!(clamp_game_speed(2.5), Some(2.5));
        assert_eq!(clamp_game_speed(f64::NAN), None);
        assert_eq!(clamp_game_speed(f64::INFINITY), None);
    }
}
