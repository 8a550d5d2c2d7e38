#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ticket Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! The immutable game-data bundle produced by the loader ([`GameData`]) and
//! the definitions it carries also live here, so that every crate agrees on
//! the identifiers and formulas inputs used across the simulation.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod data;
mod errors;
mod views;

pub use data::{
    CellType, EnemyTypeDefinition, GameData, InitialTower, SkillDefinition, TowerTypeDefinition,
    WaveDefinition, WaveEnemyEntry, DEFAULT_EFFECT_MODIFIER, DEFAULT_MAX_SKILL_LEVEL,
    DEFAULT_SPAWN_INTERVAL_MS,
};
pub use errors::{
    AttackError, DataError, PlacementError, RemovalError, SpawnError, UpgradeError, WaveError,
};
pub use views::{
    EnemySnapshot, EnemyView, SkillSnapshot, TowerSnapshot, TowerTarget, TowerView, WaveSnapshot,
    WaveView,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Ticket Defence.";

/// Highest level a tower may reach through upgrades.
pub const MAX_TOWER_LEVEL: u32 = 10;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerTypeId,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests removal of the tower standing on the provided cell.
    RemoveTower {
        /// Cell occupied by the tower targeted for removal.
        cell: CellCoord,
    },
    /// Requests that the tower on the provided cell gains one level.
    UpgradeTower {
        /// Cell occupied by the tower to upgrade.
        cell: CellCoord,
    },
    /// Requests that one skill of a tower gains one level.
    UpgradeSkill {
        /// Cell occupied by the tower owning the skill.
        cell: CellCoord,
        /// Index of the skill within the tower's ordered skill list.
        skill: usize,
    },
    /// Requests that a tower switches its active skill.
    SetActiveSkill {
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Index of the skill that should become active.
        skill: usize,
    },
    /// Requests an ad-hoc enemy spawn outside of any wave.
    SpawnEnemy {
        /// Type of enemy to create.
        kind: EnemyTypeId,
        /// Cell the enemy should appear on.
        cell: CellCoord,
        /// Difficulty level assigned to the enemy.
        level: u32,
    },
    /// Relocates an enemy; movement itself is driven by an external collaborator.
    MoveEnemy {
        /// Identifier of the enemy to relocate.
        enemy: EnemyId,
        /// Destination expressed in grid units.
        position: GridPoint,
    },
    /// Requests that a tower attacks an enemy with its active skill.
    AttackEnemy {
        /// Cell occupied by the attacking tower.
        tower: CellCoord,
        /// Identifier of the enemy being attacked.
        enemy: EnemyId,
    },
    /// Requests removal of an enemy from the active collection.
    RemoveEnemy {
        /// Identifier of the enemy to remove.
        enemy: EnemyId,
    },
    /// Requests that a configured wave begins spawning.
    StartWave {
        /// Identifier of the wave to start.
        wave: WaveId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation time after the tick was applied.
        now: Duration,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Type of tower that was placed.
        kind: TowerTypeId,
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerTypeId,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Type of tower that was removed.
        kind: TowerTypeId,
        /// Cell previously occupied by the tower.
        cell: CellCoord,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Cell targeted for removal.
        cell: CellCoord,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Level reached after the upgrade.
        level: u32,
    },
    /// Confirms that a tower skill gained a level.
    SkillUpgraded {
        /// Cell occupied by the tower owning the skill.
        cell: CellCoord,
        /// Index of the upgraded skill.
        skill: usize,
        /// Level reached after the upgrade.
        level: u32,
    },
    /// Reports that a tower or skill upgrade was rejected.
    UpgradeRejected {
        /// Cell targeted by the upgrade.
        cell: CellCoord,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower switched its active skill.
    ActiveSkillChanged {
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Index of the skill that became active.
        skill: usize,
    },
    /// Confirms that an enemy entered the world.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Type of the spawned enemy.
        kind: EnemyTypeId,
        /// Cell the enemy appeared on.
        cell: CellCoord,
        /// Wave that produced the enemy, if any.
        wave: Option<WaveId>,
    },
    /// Reports that an ad-hoc spawn request was rejected.
    EnemySpawnRejected {
        /// Type of enemy requested.
        kind: EnemyTypeId,
        /// Cell provided in the spawn request.
        cell: CellCoord,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an enemy was relocated.
    EnemyMoved {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Position before the move.
        from: GridPoint,
        /// Position after the move.
        to: GridPoint,
    },
    /// Confirms that a tower executed an attack.
    TowerAttacked {
        /// Cell occupied by the attacking tower.
        tower: CellCoord,
        /// Identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Health removed from the enemy by the hit.
        damage: f64,
    },
    /// Announces that an enemy's health reached zero. Emitted exactly once per enemy.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        enemy: EnemyId,
        /// Cell occupied by the tower that landed the final hit.
        tower: CellCoord,
        /// Reward granted for the defeat.
        reward: u32,
    },
    /// Reports that an attack request was rejected without side effects.
    AttackRejected {
        /// Cell provided as the attacking tower.
        tower: CellCoord,
        /// Identifier of the targeted enemy.
        enemy: EnemyId,
        /// Specific reason the attack failed.
        reason: AttackError,
    },
    /// Confirms that an enemy left the active collection.
    EnemyRemoved {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// Identifier of the wave.
        wave: WaveId,
    },
    /// Reports that a wave start request was rejected.
    WaveStartRejected {
        /// Identifier of the wave.
        wave: WaveId,
        /// Specific reason the start failed.
        reason: WaveError,
    },
    /// Announces that a wave spawned and lost all of its enemies.
    WaveCompleted {
        /// Identifier of the wave.
        wave: WaveId,
    },
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    #[serde(rename = "col")]
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Converts the cell into a point in grid units.
    #[must_use]
    pub fn to_point(self) -> GridPoint {
        GridPoint::new(f64::from(self.row), f64::from(self.column))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Continuous position measured in grid units.
///
/// Enemies spawn on cell coordinates but external movement drivers may place
/// them between cells, so range queries operate on points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Row component in grid units.
    pub row: f64,
    /// Column component in grid units.
    #[serde(rename = "col")]
    pub column: f64,
}

impl GridPoint {
    /// Creates a new grid point.
    #[must_use]
    pub const fn new(row: f64, column: f64) -> Self {
        Self { row, column }
    }

    /// Euclidean distance between two points, in grid units.
    #[must_use]
    pub fn distance(self, other: GridPoint) -> f64 {
        let row_diff = self.row - other.row;
        let column_diff = self.column - other.column;
        (row_diff * row_diff + column_diff * column_diff).sqrt()
    }

    /// Cell containing the point, or `None` when a component is negative or not finite.
    #[must_use]
    pub fn containing_cell(self) -> Option<CellCoord> {
        if !self.row.is_finite() || !self.column.is_finite() {
            return None;
        }
        if self.row < 0.0 || self.column < 0.0 {
            return None;
        }
        if self.row >= f64::from(u32::MAX) || self.column >= f64::from(u32::MAX) {
            return None;
        }
        Some(CellCoord::new(
            self.row.floor() as u32,
            self.column.floor() as u32,
        ))
    }
}

impl From<CellCoord> for GridPoint {
    fn from(cell: CellCoord) -> Self {
        cell.to_point()
    }
}

/// Dimensions of the rectangular map, measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    rows: u32,
    #[serde(rename = "cols")]
    columns: u32,
}

impl GridDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows in the map.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the map.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the cell lies inside the map.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }
}

/// Unique identifier assigned to an enemy when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u64);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a configured wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cell type referenced by the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellTypeId(u32);

impl CellTypeId {
    /// Creates a new cell type identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the provided text.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrows the textual representation of the identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a skill definition; doubles as the resistance tag of its damage.
    SkillId
);
string_id!(
    /// Identifier of a tower type definition.
    TowerTypeId
);
string_id!(
    /// Identifier of an enemy type definition.
    EnemyTypeId
);

/// Lifecycle of an enemy entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyLifecycle {
    /// The enemy is alive and targetable.
    Spawned,
    /// Health reached zero; the enemy lingers until removed so it can be presented once more.
    Dead,
    /// The enemy left the active collection.
    Removed,
}

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageOutcome {
    /// The enemy took damage and is still alive.
    Survived,
    /// The hit reduced health to zero. Reported exactly once per enemy.
    Killed,
    /// The enemy was already dead; nothing changed.
    AlreadyDead,
}

/// State machine position of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveStatus {
    /// The wave has not been started yet.
    Inactive,
    /// The wave is spawning or still has enemies alive.
    Active,
    /// Every enemy was spawned and defeated. Terminal.
    Completed,
}
