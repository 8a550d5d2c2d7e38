//! Session state driven by the clock: world, systems and running score.

use anyhow::{ensure, Context, Result};
use ticket_defence_clock::{GameTime, RenderTime};
use ticket_defence_core::{Command, Event, GameData};
use ticket_defence_rendering::{Hud, Scene};
use ticket_defence_system_cleanup::Cleanup;
use ticket_defence_system_movement::Movement;
use ticket_defence_system_tower_combat::TowerCombat;
use ticket_defence_system_waves::{Config as WaveScheduleConfig, WaveSchedule};
use ticket_defence_world::{self as world, query, World};
use tracing::{debug, info};

use crate::layout_transfer::TowerLayout;

/// Running totals gathered from world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Score {
    pub(crate) spawned: usize,
    pub(crate) defeated: usize,
    pub(crate) rewards: u64,
    pub(crate) attacks: usize,
}

/// World plus the systems that drive it, advanced one logic tick at a time.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    schedule: WaveSchedule,
    movement: Movement,
    combat: TowerCombat,
    cleanup: Cleanup,
    events: Vec<Event>,
    commands: Vec<Command>,
    score: Score,
}

impl Session {
    pub(crate) fn new(data: GameData, waves: WaveScheduleConfig) -> Result<Self> {
        let world = World::new(data).context("game data rejected by the world")?;
        Ok(Self {
            world,
            schedule: WaveSchedule::new(waves),
            movement: Movement::new(),
            combat: TowerCombat::new(),
            cleanup: Cleanup::new(),
            events: Vec::new(),
            commands: Vec::new(),
            score: Score::default(),
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn score(&self) -> Score {
        self.score
    }

    /// Rebuilds an exported tower layout; every placement must succeed.
    pub(crate) fn import_layout(&mut self, layout: &TowerLayout) -> Result<()> {
        let commands = layout
            .commands(query::dimensions(&self.world))
            .context("layout does not fit the loaded map")?;
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        if let Some(rejected) = events.iter().find(|event| {
            matches!(
                event,
                Event::TowerPlacementRejected { .. } | Event::UpgradeRejected { .. }
            )
        }) {
            anyhow::bail!("layout could not be applied: {rejected:?}");
        }
        info!(towers = layout.towers.len(), "layout imported");
        Ok(())
    }

    /// Runs one logic tick: cleanup, time, waves, movement, targeting, combat.
    pub(crate) fn tick(&mut self, time: &GameTime) -> Result<()> {
        self.events.clear();

        self.cleanup
            .handle(time.frame, &query::enemy_view(&self.world), &mut self.commands);
        self.flush_commands();

        world::apply(
            &mut self.world,
            Command::Tick { dt: time.delta },
            &mut self.events,
        );
        ensure!(
            query::now(&self.world) == time.elapsed,
            "world time {:?} drifted from clock time {:?}",
            query::now(&self.world),
            time.elapsed
        );

        self.schedule
            .handle(&self.events, &query::wave_view(&self.world), &mut self.commands);
        self.flush_commands();

        let snapshot = query::snapshot(&self.world);
        self.movement.handle(
            &self.events,
            &snapshot.enemies,
            snapshot.dimensions,
            |cell| snapshot.grid.is_walkable(cell),
            &mut self.commands,
        );
        self.flush_commands();

        let targets = query::tower_targets(&self.world);
        self.combat
            .handle(&query::tower_view(&self.world), &targets, &mut self.commands);
        self.flush_commands();

        self.record_events();
        Ok(())
    }

    /// Reports whether every wave ran to completion.
    pub(crate) fn is_finished(&self) -> bool {
        self.schedule.is_exhausted(&query::wave_view(&self.world))
    }

    /// Builds the scene presented for the current frame.
    pub(crate) fn scene(&self, time: &RenderTime) -> Scene {
        let snapshot = query::snapshot(&self.world);
        let walkable = snapshot.grid.iter().map(|cell| cell.is_walkable()).collect();
        Scene::new(
            snapshot.dimensions,
            walkable,
            &snapshot.towers,
            &snapshot.enemies,
            &snapshot.waves,
            Hud {
                elapsed: snapshot.now,
                fps: time.fps,
                tps: time.tps,
                defeated: self.score.defeated,
                rewards: self.score.rewards,
                ..Hud::default()
            },
        )
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    fn record_events(&mut self) {
        for event in &self.events {
            match event {
                Event::EnemySpawned { enemy, wave, .. } => {
                    self.score.spawned += 1;
                    debug!(%enemy, ?wave, "enemy entered the board");
                }
                Event::TowerAttacked { .. } => self.score.attacks += 1,
                Event::EnemyDefeated { reward, .. } => {
                    self.score.defeated += 1;
                    self.score.rewards += u64::from(*reward);
                }
                Event::WaveStarted { wave } => info!(%wave, "wave started"),
                _ => {}
            }
        }
    }
}
