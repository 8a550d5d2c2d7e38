#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Ticket Defence session headlessly.

mod config;
mod layout_transfer;
mod session;

use std::{
    fs,
    io::{self, Write},
    num::NonZeroU32,
    path::PathBuf,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use ticket_defence_clock::{GameTime, RenderTime, SimulationClock};
use ticket_defence_rendering::{RenderingBackend, TextBackend};
use ticket_defence_world::query;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{FileConfig, Overrides, Settings},
    layout_transfer::TowerLayout,
    session::Session,
};

/// Command-line arguments accepted by the Ticket Defence binary.
#[derive(Debug, Parser)]
#[command(name = "ticket-defence", version, about = "Headless Ticket Defence simulation")]
struct CliArgs {
    /// Game data bundle to load.
    #[arg(value_name = "DATA", default_value = "demos/game.json")]
    data: PathBuf,
    /// Optional TOML file with clock and wave settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Wall-clock seconds to simulate before stopping.
    #[arg(long, default_value_t = 60.0)]
    duration: f64,
    /// Frames presented per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Logic ticks per second.
    #[arg(long, value_name = "HZ")]
    tick_rate: Option<NonZeroU32>,
    /// Game speed multiplier.
    #[arg(long)]
    speed: Option<f64>,
    /// Idle time before the first wave starts.
    #[arg(long, value_name = "MS")]
    first_wave_delay_ms: Option<u64>,
    /// Idle time between a completed wave and the next one.
    #[arg(long, value_name = "MS")]
    inter_wave_delay_ms: Option<u64>,
    /// Layout string or file holding one, applied before the run.
    #[arg(long, value_name = "LAYOUT")]
    import_layout: Option<String>,
    /// Prints the final tower layout as a transferable string.
    #[arg(long)]
    export_layout: bool,
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log: String,
    /// Draws every n-th frame.
    #[arg(long, value_name = "N", default_value_t = 60)]
    render_every: u64,
    /// Disables drawing entirely.
    #[arg(long)]
    quiet: bool,
    /// Sleeps between frames instead of running as fast as possible.
    #[arg(long)]
    realtime: bool,
}

/// Entry point for the Ticket Defence command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log);

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        &file,
        Overrides {
            tick_rate: args.tick_rate,
            game_speed: args.speed,
            first_wave_delay_ms: args.first_wave_delay_ms,
            inter_wave_delay_ms: args.inter_wave_delay_ms,
        },
    );

    let data = ticket_defence_loader::load(&args.data)
        .with_context(|| format!("failed to load game data from {}", args.data.display()))?;
    let mut session = Session::new(data, settings.waves)?;
    println!("{}", query::welcome_banner(session.world()));

    if let Some(layout) = &args.import_layout {
        let layout = read_layout(layout)?;
        session.import_layout(&layout)?;
    }

    let mut clock = SimulationClock::new(settings.clock);
    let _ = clock.subscribe_logic(|session: &mut Session, time: &GameTime| session.tick(time));
    if !args.quiet {
        let every = args.render_every.max(1);
        let mut backend = TextBackend::new(io::stdout());
        let _ = clock.subscribe_render(move |session: &Session, time: &RenderTime| {
            if time.frame % every != 0 {
                return;
            }
            if let Err(error) = backend.present(&session.scene(time)) {
                warn!(%error, "failed to present frame");
            }
        });
    }

    let frame = Duration::from_secs(1) / args.fps.max(1);
    let limit = Duration::try_from_secs_f64(args.duration.max(0.0))
        .with_context(|| format!("invalid duration {}", args.duration))?;
    let mut now = Duration::ZERO;
    let _ = clock.start(now);
    info!(
        tick_rate = clock.config().tick_rate().get(),
        speed = clock.game_speed(),
        "simulation started"
    );

    while now < limit && !session.is_finished() {
        now += frame;
        let report = clock.frame(now, &mut session)?;
        if report.dropped_ticks > 0 {
            warn!(dropped = report.dropped_ticks, "simulation fell behind");
        }
        if args.realtime {
            thread::sleep(frame);
        }
    }
    let _ = clock.stop();

    let score = session.score();
    info!(
        ticks = clock.ticks(),
        frames = clock.frames(),
        elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        "simulation stopped"
    );
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "finished={} ticks={} spawned={} defeated={} attacks={} rewards={}",
        session.is_finished(),
        clock.ticks(),
        score.spawned,
        score.defeated,
        score.attacks,
        score.rewards
    )?;

    if args.export_layout {
        let encoded = TowerLayout::capture(session.world()).encode()?;
        writeln!(stdout, "{encoded}")?;
    }
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn read_layout(value: &str) -> Result<TowerLayout> {
    let contents = if value.trim_start().starts_with(layout_transfer::LAYOUT_HEADER) {
        value.to_owned()
    } else {
        fs::read_to_string(value).with_context(|| format!("failed to read layout file {value}"))?
    };
    TowerLayout::decode(&contents).context("invalid layout string")
}
