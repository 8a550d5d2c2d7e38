#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Ticket Defence adapters.

use std::{fmt::Write as _, io::Write, time::Duration};

use anyhow::{Context, Result as AnyResult};
use ticket_defence_core::{
    CellCoord, EnemyId, EnemyLifecycle, EnemyView, GridDimensions, GridPoint, TowerTypeId,
    TowerView, WaveStatus, WaveView,
};

/// Tower drawn on top of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneTower {
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Type the tower was built from.
    pub kind: TowerTypeId,
    /// Current tower level.
    pub level: u32,
    /// Whether the tower may attack right now.
    pub ready: bool,
}

/// Enemy drawn on top of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneEnemy {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Position in grid units.
    pub position: GridPoint,
    /// Remaining health in percent.
    pub health_percentage: f64,
    /// Whether the enemy is still alive; dead enemies are shown for one frame.
    pub alive: bool,
}

/// Status line describing the running wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveBanner {
    /// Display name of the wave.
    pub name: String,
    /// Defeated share of the wave, in percent.
    pub progress: f64,
}

/// Timing and score information shown next to the grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hud {
    /// Simulated time shown to the player.
    pub elapsed: Duration,
    /// Frames per second.
    pub fps: f64,
    /// Logic ticks per second.
    pub tps: f64,
    /// Wave currently running, if any.
    pub wave: Option<WaveBanner>,
    /// Waves that ran to completion.
    pub waves_completed: usize,
    /// Enemies defeated so far.
    pub defeated: usize,
    /// Rewards collected so far.
    pub rewards: u64,
}

/// Scene description combining the grid and its inhabitants.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Map dimensions in cells.
    pub dimensions: GridDimensions,
    /// Walkability of every cell in row-major order.
    pub walkable: Vec<bool>,
    /// Towers in placement order.
    pub towers: Vec<SceneTower>,
    /// Enemies in spawn order.
    pub enemies: Vec<SceneEnemy>,
    /// Heads-up display content.
    pub hud: Hud,
}

impl Scene {
    /// Creates a scene from the world views.
    ///
    /// `walkable` must list one entry per cell in row-major order.
    #[must_use]
    pub fn new(
        dimensions: GridDimensions,
        walkable: Vec<bool>,
        towers: &TowerView,
        enemies: &EnemyView,
        waves: &WaveView,
        hud: Hud,
    ) -> Self {
        let towers = towers
            .iter()
            .map(|tower| SceneTower {
                cell: tower.cell,
                kind: tower.kind.clone(),
                level: tower.level,
                ready: tower.ready,
            })
            .collect();
        let enemies = enemies
            .iter()
            .filter(|enemy| enemy.lifecycle != EnemyLifecycle::Removed)
            .map(|enemy| SceneEnemy {
                id: enemy.id,
                position: enemy.position,
                health_percentage: enemy.health_percentage(),
                alive: enemy.lifecycle == EnemyLifecycle::Spawned,
            })
            .collect();
        let hud = Hud {
            wave: waves.active().map(|wave| WaveBanner {
                name: wave.name.clone(),
                progress: wave.progress,
            }),
            waves_completed: waves
                .iter()
                .filter(|wave| wave.status == WaveStatus::Completed)
                .count(),
            ..hud
        };
        Self {
            dimensions,
            walkable,
            towers,
            enemies,
            hud,
        }
    }

    fn is_walkable(&self, row: u32, column: u32) -> bool {
        let index = row as usize * self.dimensions.columns() as usize + column as usize;
        self.walkable.get(index).copied().unwrap_or(false)
    }
}

/// Rendering backend capable of presenting Ticket Defence scenes.
pub trait RenderingBackend {
    /// Presents one frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Backend that draws scenes as text, one glyph per cell.
///
/// `#` marks terrain enemies cannot cross, `.` the path, `T` a ready tower,
/// `t` a cooling tower, `e` a living enemy and `x` a defeated one.
#[derive(Debug)]
pub struct TextBackend<W> {
    writer: W,
    buffer: String,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing frames to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: String::new(),
        }
    }

    /// Consumes the backend, yielding the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn compose(&mut self, scene: &Scene) -> std::fmt::Result {
        self.buffer.clear();
        let rows = scene.dimensions.rows();
        let columns = scene.dimensions.columns();
        let mut glyphs: Vec<char> = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| (row, column)))
            .map(|(row, column)| if scene.is_walkable(row, column) { '.' } else { '#' })
            .collect();

        let mut put = |cell: CellCoord, glyph: char| {
            if scene.dimensions.contains(cell) {
                glyphs[cell.row() as usize * columns as usize + cell.column() as usize] = glyph;
            }
        };
        for tower in &scene.towers {
            put(tower.cell, if tower.ready { 'T' } else { 't' });
        }
        for enemy in scene.enemies.iter().filter(|enemy| !enemy.alive) {
            if let Some(cell) = enemy.position.containing_cell() {
                put(cell, 'x');
            }
        }
        for enemy in scene.enemies.iter().filter(|enemy| enemy.alive) {
            if let Some(cell) = enemy.position.containing_cell() {
                put(cell, 'e');
            }
        }

        for row in glyphs.chunks(columns.max(1) as usize) {
            self.buffer.extend(row.iter());
            self.buffer.push('\n');
        }

        let hud = &scene.hud;
        write!(
            self.buffer,
            "t={:.1}s fps={:.0} tps={:.0} waves={} defeated={} rewards={}",
            hud.elapsed.as_secs_f64(),
            hud.fps,
            hud.tps,
            hud.waves_completed,
            hud.defeated,
            hud.rewards,
        )?;
        if let Some(wave) = &hud.wave {
            write!(self.buffer, " | {} {:.0}%", wave.name, wave.progress)?;
        }
        self.buffer.push('\n');
        Ok(())
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        self.compose(scene).context("failed to compose text frame")?;
        self.writer
            .write_all(self.buffer.as_bytes())
            .context("failed to write text frame")?;
        self.writer.flush().context("failed to flush text frame")
    }
}
