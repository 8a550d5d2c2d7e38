#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that starts configured waves one after another.

use std::time::Duration;

use ticket_defence_core::{Command, Event, WaveStatus, WaveView};
use tracing::debug;

const DEFAULT_INTER_WAVE_DELAY: Duration = Duration::from_secs(5);

/// Configuration parameters required to construct the wave schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    first_wave_delay: Duration,
    inter_wave_delay: Duration,
}

impl Config {
    /// Creates a new configuration using the provided delays.
    #[must_use]
    pub const fn new(first_wave_delay: Duration, inter_wave_delay: Duration) -> Self {
        Self {
            first_wave_delay,
            inter_wave_delay,
        }
    }

    /// Simulated time before the first wave starts.
    #[must_use]
    pub const fn first_wave_delay(&self) -> Duration {
        self.first_wave_delay
    }

    /// Simulated time between a wave completing and the next one starting.
    #[must_use]
    pub const fn inter_wave_delay(&self) -> Duration {
        self.inter_wave_delay
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::ZERO, DEFAULT_INTER_WAVE_DELAY)
    }
}

/// Starts waves in declaration order, keeping at most one wave active.
#[derive(Debug)]
pub struct WaveSchedule {
    config: Config,
    idle: Duration,
    started: usize,
}

impl WaveSchedule {
    /// Creates a new schedule using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            idle: Duration::ZERO,
            started: 0,
        }
    }

    /// Consumes tick events and the wave view to emit at most one start command.
    pub fn handle(&mut self, events: &[Event], waves: &WaveView, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => self.idle = self.idle.saturating_add(*dt),
                Event::WaveCompleted { .. } => self.idle = Duration::ZERO,
                _ => {}
            }
        }

        if waves.active().is_some() {
            self.idle = Duration::ZERO;
            return;
        }

        let Some(next) = waves
            .iter()
            .find(|wave| wave.status == WaveStatus::Inactive)
        else {
            return;
        };

        if self.idle < self.delay() {
            return;
        }

        debug!(wave = %next.id, waited = ?self.idle, "scheduling wave start");
        self.idle = Duration::ZERO;
        self.started += 1;
        out.push(Command::StartWave { wave: next.id });
    }

    /// Reports whether every configured wave ran to completion.
    #[must_use]
    pub fn is_exhausted(&self, waves: &WaveView) -> bool {
        waves
            .iter()
            .all(|wave| wave.status == WaveStatus::Completed)
    }

    fn delay(&self) -> Duration {
        if self.started == 0 {
            self.config.first_wave_delay
        } else {
            self.config.inter_wave_delay
        }
    }
}
