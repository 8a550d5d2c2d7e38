//! Read-only snapshots handed to systems and renderers.

use std::time::Duration;

use crate::{
    CellCoord, EnemyId, EnemyLifecycle, EnemyTypeId, GridPoint, SkillId, TowerTypeId, WaveId,
    WaveStatus,
};

/// Immutable representation of one tower skill.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillSnapshot {
    /// Definition the skill was built from.
    pub id: SkillId,
    /// Current level of the skill.
    pub level: u32,
    /// Level cap of the skill.
    pub max_level: u32,
    /// Level-scaled damage, before tower bonuses.
    pub damage: f64,
    /// Level-scaled range, before tower bonuses.
    pub range: f64,
    /// Level-scaled cooldown, before tower bonuses.
    pub cooldown: Duration,
    /// Price of the next skill level.
    pub upgrade_cost: u32,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Cell occupied by the tower; unique per tower.
    pub cell: CellCoord,
    /// Type the tower was built from.
    pub kind: TowerTypeId,
    /// Current tower level.
    pub level: u32,
    /// Index of the active skill, `None` when the tower has no skills.
    pub active_skill: Option<usize>,
    /// Skills in their configured order.
    pub skills: Vec<SkillSnapshot>,
    /// Effective range of the active skill including the tower bonus.
    pub range: f64,
    /// Effective damage of the active skill including the tower bonus.
    pub damage: f64,
    /// Effective cooldown of the active skill including the tower bonus.
    pub cooldown: Duration,
    /// Whether the tower may attack at the time the snapshot was taken.
    pub ready: bool,
    /// Price of the next tower level.
    pub upgrade_cost: u32,
}

/// Read-only snapshot describing all towers in placement order.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from snapshots already in placement order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<TowerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated at spawn.
    pub id: EnemyId,
    /// Type the enemy was spawned from.
    pub kind: EnemyTypeId,
    /// Cell the enemy appeared on.
    pub spawn_cell: CellCoord,
    /// Current position in grid units.
    pub position: GridPoint,
    /// Cells per second an external movement driver should use.
    pub speed: f64,
    /// Difficulty level fixed at spawn.
    pub level: u32,
    /// Remaining health.
    pub health: f64,
    /// Health at spawn.
    pub max_health: f64,
    /// Lifecycle state.
    pub lifecycle: EnemyLifecycle,
    /// Reward granted when defeated.
    pub reward: u32,
    /// Wave that produced the enemy, if any.
    pub wave: Option<WaveId>,
}

impl EnemySnapshot {
    /// Remaining health as a percentage of the maximum.
    #[must_use]
    pub fn health_percentage(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        100.0 * self.health / self.max_health
    }
}

/// Read-only snapshot describing all enemies in spawn order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from snapshots already in spawn order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over enemies that are still alive.
    pub fn alive(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.lifecycle == EnemyLifecycle::Spawned)
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Closest alive enemy within a tower's range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Cell occupied by the tower.
    pub tower: CellCoord,
    /// Enemy selected as the target.
    pub enemy: EnemyId,
    /// Euclidean distance between the tower and the enemy.
    pub distance: f64,
}

/// Immutable representation of a single wave's progress.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveSnapshot {
    /// Identifier of the wave.
    pub id: WaveId,
    /// Display name of the wave.
    pub name: String,
    /// State machine position.
    pub status: WaveStatus,
    /// Spawns that have not been released yet.
    pub pending: usize,
    /// Spawned enemies that were not defeated yet.
    pub active: usize,
    /// Enemies defeated so far.
    pub defeated: usize,
    /// Total number of scheduled spawns.
    pub total: usize,
    /// Defeated share of the wave, in percent.
    pub progress: f64,
}

/// Read-only snapshot describing all configured waves in declaration order.
#[derive(Clone, Debug, Default)]
pub struct WaveView {
    snapshots: Vec<WaveSnapshot>,
}

impl WaveView {
    /// Creates a new wave view from snapshots in declaration order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<WaveSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured wave snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &WaveSnapshot> {
        self.snapshots.iter()
    }

    /// Wave currently spawning or fighting, if any.
    #[must_use]
    pub fn active(&self) -> Option<&WaveSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.status == WaveStatus::Active)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WaveSnapshot> {
        self.snapshots
    }
}
