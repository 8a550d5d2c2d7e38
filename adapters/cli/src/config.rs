//! Clock and wave settings merged from a TOML file and command-line flags.

use std::{fs, num::NonZeroU32, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use ticket_defence_clock::ClockConfig;
use ticket_defence_system_waves::Config as WaveScheduleConfig;

/// Optional overrides read from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) clock: ClockSection,
    pub(crate) waves: WaveSection,
}

/// `[clock]` table.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClockSection {
    pub(crate) tick_rate: Option<NonZeroU32>,
    pub(crate) game_speed: Option<f64>,
    pub(crate) max_ticks_per_frame: Option<NonZeroU32>,
}

/// `[waves]` table.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WaveSection {
    pub(crate) first_wave_delay_ms: Option<u64>,
    pub(crate) inter_wave_delay_ms: Option<u64>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }
}

/// Runtime settings after merging file values with command-line overrides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) clock: ClockConfig,
    pub(crate) waves: WaveScheduleConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Overrides {
    pub(crate) tick_rate: Option<NonZeroU32>,
    pub(crate) game_speed: Option<f64>,
    pub(crate) first_wave_delay_ms: Option<u64>,
    pub(crate) inter_wave_delay_ms: Option<u64>,
}

impl Settings {
    pub(crate) fn resolve(file: &FileConfig, overrides: Overrides) -> Self {
        let defaults = ClockConfig::default();
        let mut clock = ClockConfig::new(
            overrides
                .tick_rate
                .or(file.clock.tick_rate)
                .unwrap_or(defaults.tick_rate()),
        )
        .with_game_speed(
            overrides
                .game_speed
                .or(file.clock.game_speed)
                .unwrap_or(defaults.game_speed()),
        );
        if let Some(cap) = file.clock.max_ticks_per_frame {
            clock = clock.with_max_ticks_per_frame(cap);
        }

        let schedule = WaveScheduleConfig::default();
        let first_wave_delay = overrides
            .first_wave_delay_ms
            .or(file.waves.first_wave_delay_ms)
            .map_or(schedule.first_wave_delay(), Duration::from_millis);
        let inter_wave_delay = overrides
            .inter_wave_delay_ms
            .or(file.waves.inter_wave_delay_ms)
            .map_or(schedule.inter_wave_delay(), Duration::from_millis);

        Self {
            clock,
            waves: WaveScheduleConfig::new(first_wave_delay, inter_wave_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let file = FileConfig::parse("").expect("empty toml is valid");
        let settings = Settings::resolve(&file, Overrides::default());

        assert_eq!(settings.clock, ClockConfig::default());
        assert_eq!(settings.waves, WaveScheduleConfig::default());
    }

    #[test]
    fn command_line_overrides_file_values() {
        let file = FileConfig::parse(
            "[clock]\ntick_rate = 20\ngame_speed = 2.0\nmax_ticks_per_frame = 8\n\n[waves]\nfirst_wave_delay_ms = 1500\n",
        )
        .expect("valid toml");
        let overrides = Overrides {
            tick_rate: NonZeroU32::new(60),
            ..Overrides::default()
        };

        let settings = Settings::resolve(&file, overrides);

        assert_eq!(settings.clock.tick_rate().get(), 60);
        assert_eq!(settings.clock.game_speed(), 2.0);
        assert_eq!(settings.clock.max_ticks_per_frame().get(), 8);
        assert_eq!(settings.waves.first_wave_delay(), Duration::from_millis(1_500));
        assert_eq!(settings.waves.inter_wave_delay(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[clock]\nticks = 3\n").is_err());
        assert!(FileConfig::parse("[clock]\ntick_rate = 0\n").is_err());
    }

    #[test]
    fn bundled_demo_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/ticket-defence.toml");
        let file = FileConfig::load(&path).expect("demo config loads");
        assert_eq!(file.waves.inter_wave_delay_ms, Some(3_000));
    }
}
