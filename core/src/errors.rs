//! Rejection reasons reported by the world and construction failures of the bundle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, CellTypeId, EnemyTypeId, SkillId, TowerTypeId, WaveId};

/// Construction-fatal problems with a game-data bundle.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DataError {
    /// The map contains no cells.
    #[error("map must contain at least one row and one column")]
    EmptyMap,
    /// A map row has a different column count than the first row.
    #[error("map row {row} has {found} columns, expected {expected}")]
    NonRectangular {
        /// Index of the offending row.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// The map exceeds the addressable coordinate range.
    #[error("map dimensions exceed the addressable range")]
    MapTooLarge,
    /// The map references a cell type that is not defined.
    #[error("cell ({row}, {column}) references unknown cell type {id}")]
    UnknownCellType {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        column: usize,
        /// Identifier that failed to resolve.
        id: CellTypeId,
    },
    /// Two definitions of the same category share an identifier.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Category of the duplicated definition.
        kind: &'static str,
        /// Duplicated identifier.
        id: String,
    },
    /// A skill definition caps its level at zero.
    #[error("skill '{0}' must allow at least level 1")]
    ZeroMaxLevel(SkillId),
    /// A tower type references a skill that is not defined.
    #[error("tower type '{tower_type}' references unknown skill '{skill}'")]
    UnknownSkill {
        /// Tower type holding the reference.
        tower_type: TowerTypeId,
        /// Skill that failed to resolve.
        skill: SkillId,
    },
    /// A resistance fraction lies outside `[0, 1]`.
    #[error("enemy type '{enemy_type}' resistance to '{skill}' is {value}, expected a value in [0, 1]")]
    InvalidResistance {
        /// Enemy type holding the resistance.
        enemy_type: EnemyTypeId,
        /// Skill tag the resistance applies to.
        skill: SkillId,
        /// Offending fraction.
        value: f64,
    },
    /// A tower type identifier failed to resolve.
    #[error("unknown tower type '{0}'")]
    UnknownTowerType(TowerTypeId),
    /// An initial tower could not be placed.
    #[error("initial tower '{kind}' at {cell} was rejected: {reason}")]
    InitialTowerRejected {
        /// Type of the initial tower.
        kind: TowerTypeId,
        /// Cell requested for the initial tower.
        cell: CellCoord,
        /// Reason reported by placement.
        reason: PlacementError,
    },
    /// A wave declares no spawn points.
    #[error("wave {0} declares no spawn points")]
    MissingSpawnPoints(WaveId),
    /// A wave spawn point is out of bounds or not walkable.
    #[error("wave {wave} spawn point {cell} is not a walkable cell on the map")]
    InvalidSpawnPoint {
        /// Wave declaring the spawn point.
        wave: WaveId,
        /// Offending cell.
        cell: CellCoord,
    },
    /// A wave schedules an enemy type that is not defined.
    #[error("wave {wave} schedules unknown enemy type '{enemy_type}'")]
    UnknownWaveEnemy {
        /// Wave holding the reference.
        wave: WaveId,
        /// Enemy type that failed to resolve.
        enemy_type: EnemyTypeId,
    },
    /// A wave schedules an enemy at level zero.
    #[error("wave {wave} schedules an enemy at level 0")]
    InvalidEnemyLevel {
        /// Wave holding the entry.
        wave: WaveId,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested tower type is not defined.
    #[error("unknown tower type")]
    UnknownTowerType,
    /// The requested cell lies beyond the map bounds.
    #[error("cell is out of bounds")]
    OutOfBounds,
    /// Another tower already occupies the requested cell.
    #[error("cell is occupied")]
    Occupied,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// No tower stands on the provided cell.
    #[error("no tower on cell")]
    MissingTower,
}

/// Reasons an enemy spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// The requested enemy type is not defined.
    #[error("unknown enemy type")]
    UnknownEnemyType,
    /// The requested cell lies beyond the map bounds.
    #[error("cell is out of bounds")]
    OutOfBounds,
    /// The requested cell is not walkable.
    #[error("cell is not walkable")]
    NotWalkable,
    /// Enemies start at level 1.
    #[error("enemy level must be at least 1")]
    InvalidLevel,
}

/// Reasons a tower or skill upgrade may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No tower stands on the provided cell.
    #[error("no tower on cell")]
    MissingTower,
    /// The skill index does not address one of the tower's skills.
    #[error("skill index out of range")]
    InvalidSkill,
    /// The tower or skill already reached its level cap.
    #[error("already at maximum level")]
    MaxLevel,
}

/// Reasons an attack request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum AttackError {
    /// No tower stands on the provided cell.
    #[error("no tower on cell")]
    MissingTower,
    /// The tower has no skill to attack with.
    #[error("tower has no active skill")]
    NoActiveSkill,
    /// The tower is still cooling down.
    #[error("tower is cooling down")]
    NotReady,
    /// No enemy with the provided identifier exists.
    #[error("unknown enemy")]
    MissingEnemy,
    /// The enemy is already dead.
    #[error("enemy is already dead")]
    EnemyDead,
    /// The enemy lies beyond the tower's range.
    #[error("enemy is out of range")]
    OutOfRange,
}

/// Reasons a wave start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum WaveError {
    /// No wave with the provided identifier is configured.
    #[error("unknown wave")]
    UnknownWave,
    /// The wave already left the inactive state.
    #[error("wave was already started")]
    AlreadyStarted,
}
