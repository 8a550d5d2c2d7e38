//! Immutable game-data bundle produced by the loader.
//!
//! Field names follow the JSON asset format, which is why several fields are
//! renamed on the wire (`damage`, `cooldown`, `cssClass`, `type`, ...).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    CellCoord, CellTypeId, DataError, EnemyTypeId, GridDimensions, SkillId, TowerTypeId, WaveId,
};

/// Effect modifier applied when a skill definition omits one.
pub const DEFAULT_EFFECT_MODIFIER: f64 = 1.0;

/// Level cap applied when a skill definition omits one.
pub const DEFAULT_MAX_SKILL_LEVEL: u32 = 10;

/// Spawn cadence applied when a wave definition omits one.
pub const DEFAULT_SPAWN_INTERVAL_MS: u64 = 2_000;

/// Terrain category shared by every map cell that references it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellType {
    /// Identifier referenced from the map.
    pub id: CellTypeId,
    /// Whether enemies may stand on cells of this type.
    pub walkable: bool,
    /// Presentation hint consumed by renderers.
    #[serde(rename = "cssClass", default)]
    pub visual_tag: String,
}

/// Template describing a leveled attack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDefinition {
    /// Identifier of the skill, also used as the resistance tag of its damage.
    pub id: SkillId,
    /// Internal name.
    #[serde(default)]
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Damage dealt at level 1.
    #[serde(rename = "damage")]
    pub base_damage: f64,
    /// Range in grid units at level 1.
    #[serde(rename = "range")]
    pub base_range: f64,
    /// Cooldown between attacks at level 1, in milliseconds.
    #[serde(rename = "cooldown")]
    pub base_cooldown_ms: u64,
    /// Enemy target tag this skill is specialised against.
    #[serde(default)]
    pub target_type: Option<String>,
    /// Damage multiplier applied against enemies carrying `target_type`.
    #[serde(default = "default_effect_modifier")]
    pub effect_modifier: f64,
    /// Highest level reachable through upgrades.
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Free-form description shown by presentation layers.
    #[serde(default)]
    pub description: String,
    /// Presentation hint consumed by renderers.
    #[serde(rename = "cssClass", default)]
    pub visual_tag: String,
}

/// Template describing a placeable tower.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerTypeDefinition {
    /// Identifier of the tower type.
    pub id: TowerTypeId,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Placement cost.
    #[serde(default)]
    pub cost: u32,
    /// Presentation hint consumed by renderers.
    #[serde(rename = "cssClass", default)]
    pub visual_tag: String,
    /// Ordered skills every tower of this type is built with.
    #[serde(rename = "skills", default)]
    pub skill_ids: Vec<SkillId>,
}

/// Template describing a hostile unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeDefinition {
    /// Identifier of the enemy type.
    pub id: EnemyTypeId,
    /// Tag compared against a skill's `target_type`.
    #[serde(rename = "type")]
    pub target_tag: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Health at level 1.
    #[serde(rename = "health")]
    pub base_health: f64,
    /// Movement speed in cells per second, consumed by external movement drivers.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Reward granted at level 1.
    #[serde(rename = "reward", default)]
    pub base_reward: u32,
    /// Fraction of damage ignored per skill tag.
    #[serde(default)]
    pub resistance: BTreeMap<SkillId, f64>,
    /// Presentation hint consumed by renderers.
    #[serde(rename = "cssClass", default)]
    pub visual_tag: String,
}

/// Tower placed when the world is constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialTower {
    /// Type of tower to place.
    #[serde(rename = "type")]
    pub kind: TowerTypeId,
    /// Cell the tower occupies.
    pub position: CellCoord,
}

/// One scheduled spawn within a wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveEnemyEntry {
    /// Type of enemy to spawn.
    #[serde(rename = "type")]
    pub kind: EnemyTypeId,
    /// Difficulty level of the spawned enemy.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Index into the wave's spawn points.
    #[serde(default)]
    pub spawn_point: usize,
}

/// Timed, ordered spawn schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveDefinition {
    /// Identifier of the wave.
    pub id: WaveId,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Minimum simulated time between two spawns, in milliseconds.
    #[serde(rename = "spawnInterval", default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,
    /// Cells enemies may appear on.
    #[serde(default)]
    pub spawn_points: Vec<CellCoord>,
    /// Spawns in the order they are released.
    #[serde(default)]
    pub enemies: Vec<WaveEnemyEntry>,
}

impl WaveDefinition {
    /// Name shown for the wave, falling back to `Wave {id}`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Wave {}", self.id))
    }
}

/// Immutable bundle handed from the loader to the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    /// Rows of cell-type identifiers.
    pub map: Vec<Vec<CellTypeId>>,
    /// Terrain categories referenced by the map.
    pub cell_types: Vec<CellType>,
    /// Placeable tower types.
    #[serde(default)]
    pub tower_types: Vec<TowerTypeDefinition>,
    /// Skill templates referenced by tower types.
    #[serde(default)]
    pub skills: Vec<SkillDefinition>,
    /// Hostile unit templates.
    #[serde(default)]
    pub enemy_types: Vec<EnemyTypeDefinition>,
    /// Towers placed at construction.
    #[serde(default)]
    pub initial_towers: Vec<InitialTower>,
    /// Spawn schedules.
    #[serde(default)]
    pub waves: Vec<WaveDefinition>,
}

impl GameData {
    /// Checks every cross reference in the bundle and returns the map dimensions.
    ///
    /// The first violation found is reported; no partially valid bundle is
    /// ever accepted.
    pub fn validate(&self) -> Result<GridDimensions, DataError> {
        let dimensions = self.map_dimensions()?;

        let mut walkable: HashMap<CellTypeId, bool> = HashMap::new();
        for cell_type in &self.cell_types {
            if walkable.insert(cell_type.id, cell_type.walkable).is_some() {
                return Err(DataError::DuplicateId {
                    kind: "cell type",
                    id: cell_type.id.to_string(),
                });
            }
        }
        for (row, cells) in self.map.iter().enumerate() {
            for (column, id) in cells.iter().enumerate() {
                if !walkable.contains_key(id) {
                    return Err(DataError::UnknownCellType {
                        row,
                        column,
                        id: *id,
                    });
                }
            }
        }

        let mut skills = HashSet::new();
        for skill in &self.skills {
            if !skills.insert(&skill.id) {
                return Err(DataError::DuplicateId {
                    kind: "skill",
                    id: skill.id.to_string(),
                });
            }
            if skill.max_level == 0 {
                return Err(DataError::ZeroMaxLevel(skill.id.clone()));
            }
        }

        let mut tower_types = HashSet::new();
        for tower_type in &self.tower_types {
            if !tower_types.insert(&tower_type.id) {
                return Err(DataError::DuplicateId {
                    kind: "tower type",
                    id: tower_type.id.to_string(),
                });
            }
            if let Some(missing) = tower_type
                .skill_ids
                .iter()
                .find(|skill| !skills.contains(skill))
            {
                return Err(DataError::UnknownSkill {
                    tower_type: tower_type.id.clone(),
                    skill: missing.clone(),
                });
            }
        }

        let mut enemy_types = HashSet::new();
        for enemy_type in &self.enemy_types {
            if !enemy_types.insert(&enemy_type.id) {
                return Err(DataError::DuplicateId {
                    kind: "enemy type",
                    id: enemy_type.id.to_string(),
                });
            }
            for (skill, value) in &enemy_type.resistance {
                if !(0.0..=1.0).contains(value) {
                    return Err(DataError::InvalidResistance {
                        enemy_type: enemy_type.id.clone(),
                        skill: skill.clone(),
                        value: *value,
                    });
                }
            }
        }

        for tower in &self.initial_towers {
            if !tower_types.contains(&tower.kind) {
                return Err(DataError::UnknownTowerType(tower.kind.clone()));
            }
        }

        let mut waves = HashSet::new();
        for wave in &self.waves {
            if !waves.insert(wave.id) {
                return Err(DataError::DuplicateId {
                    kind: "wave",
                    id: wave.id.to_string(),
                });
            }
            if wave.spawn_points.is_empty() {
                return Err(DataError::MissingSpawnPoints(wave.id));
            }
            for cell in &wave.spawn_points {
                let walkable_cell = dimensions.contains(*cell)
                    && self
                        .cell_type_at(*cell)
                        .and_then(|id| walkable.get(&id).copied())
                        .unwrap_or(false);
                if !walkable_cell {
                    return Err(DataError::InvalidSpawnPoint {
                        wave: wave.id,
                        cell: *cell,
                    });
                }
            }
            for entry in &wave.enemies {
                if !enemy_types.contains(&entry.kind) {
                    return Err(DataError::UnknownWaveEnemy {
                        wave: wave.id,
                        enemy_type: entry.kind.clone(),
                    });
                }
                if entry.level == 0 {
                    return Err(DataError::InvalidEnemyLevel { wave: wave.id });
                }
            }
        }

        Ok(dimensions)
    }

    fn map_dimensions(&self) -> Result<GridDimensions, DataError> {
        let columns = self.map.first().map_or(0, Vec::len);
        if columns == 0 {
            return Err(DataError::EmptyMap);
        }
        for (row, cells) in self.map.iter().enumerate() {
            if cells.len() != columns {
                return Err(DataError::NonRectangular {
                    row,
                    expected: columns,
                    found: cells.len(),
                });
            }
        }

        let rows = u32::try_from(self.map.len()).map_err(|_| DataError::MapTooLarge)?;
        let columns = u32::try_from(columns).map_err(|_| DataError::MapTooLarge)?;
        Ok(GridDimensions::new(rows, columns))
    }

    fn cell_type_at(&self, cell: CellCoord) -> Option<CellTypeId> {
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        self.map.get(row)?.get(column).copied()
    }
}

fn default_effect_modifier() -> f64 {
    DEFAULT_EFFECT_MODIFIER
}

fn default_max_level() -> u32 {
    DEFAULT_MAX_SKILL_LEVEL
}

fn default_speed() -> f64 {
    1.0
}

fn default_level() -> u32 {
    1
}

fn default_spawn_interval_ms() -> u64 {
    DEFAULT_SPAWN_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "map": [[0, 1, 0], [0, 1, 0]],
        "cellTypes": [
            { "id": 0, "walkable": false, "cssClass": "grass" },
            { "id": 1, "walkable": true, "cssClass": "path" }
        ],
        "towerTypes": [
            { "id": "frontend_dev", "label": "Frontend", "cost": 100, "skills": ["html_css"] }
        ],
        "skills": [
            { "id": "html_css", "name": "html", "damage": 10, "range": 3, "cooldown": 1000,
              "targetType": "frontend", "effectModifier": 1.5 }
        ],
        "enemyTypes": [
            { "id": "frontend_ticket", "type": "frontend", "health": 100, "speed": 1,
              "reward": 10, "resistance": { "html_css": 0.2 } }
        ],
        "initialTowers": [ { "type": "frontend_dev", "position": { "row": 0, "col": 0 } } ],
        "waves": [
            { "id": 1, "spawnPoints": [ { "row": 0, "col": 1 } ],
              "enemies": [ { "type": "frontend_ticket" }, { "type": "frontend_ticket", "level": 2 } ] }
        ]
    }"#;

    fn sample() -> GameData {
        serde_json::from_str(SAMPLE).expect("sample parses")
    }

    #[test]
    fn asset_format_parses_with_defaults() {
        let data = sample();
        let skill = &data.skills[0];
        assert_eq!(skill.base_cooldown_ms, 1_000);
        assert_eq!(skill.max_level, DEFAULT_MAX_SKILL_LEVEL);
        assert_eq!(skill.target_type.as_deref(), Some("frontend"));

        let wave = &data.waves[0];
        assert_eq!(wave.spawn_interval_ms, DEFAULT_SPAWN_INTERVAL_MS);
        assert_eq!(wave.enemies[0].level, 1);
        assert_eq!(wave.enemies[0].spawn_point, 0);
        assert_eq!(wave.display_name(), "Wave 1");

        assert_eq!(data.validate(), Ok(GridDimensions::new(2, 3)));
    }

    #[test]
    fn ragged_map_is_rejected() {
        let mut data = sample();
        data.map[1].push(CellTypeId::new(0));
        assert_eq!(
            data.validate(),
            Err(DataError::NonRectangular {
                row: 1,
                expected: 3,
                found: 4,
            })
        );
    }

    #[test]
    fn empty_map_is_rejected() {
        let mut data = sample();
        data.map.clear();
        assert_eq!(data.validate(), Err(DataError::EmptyMap));
    }

    #[test]
    fn unknown_cell_type_is_rejected() {
        let mut data = sample();
        data.map[0][2] = CellTypeId::new(7);
        assert_eq!(
            data.validate(),
            Err(DataError::UnknownCellType {
                row: 0,
                column: 2,
                id: CellTypeId::new(7),
            })
        );
    }

    #[test]
    fn tower_type_with_unknown_skill_is_rejected() {
        let mut data = sample();
        data.tower_types[0].skill_ids.push(SkillId::new("rust"));
        assert!(matches!(
            data.validate(),
            Err(DataError::UnknownSkill { skill, .. }) if skill == SkillId::new("rust")
        ));
    }

    #[test]
    fn resistance_outside_unit_interval_is_rejected() {
        let mut data = sample();
        let _ = data.enemy_types[0]
            .resistance
            .insert(SkillId::new("html_css"), 1.5);
        assert!(matches!(
            data.validate(),
            Err(DataError::InvalidResistance { .. })
        ));
    }

    #[test]
    fn wave_spawn_points_must_be_walkable() {
        let mut data = sample();
        data.waves[0].spawn_points = vec![CellCoord::new(0, 0)];
        assert_eq!(
            data.validate(),
            Err(DataError::InvalidSpawnPoint {
                wave: WaveId::new(1),
                cell: CellCoord::new(0, 0),
            })
        );

        data.waves[0].spawn_points.clear();
        assert_eq!(
            data.validate(),
            Err(DataError::MissingSpawnPoints(WaveId::new(1)))
        );
    }

    #[test]
    fn wave_with_unknown_enemy_type_is_rejected() {
        let mut data = sample();
        data.waves[0].enemies[1].kind = EnemyTypeId::new("backend_ticket");
        assert!(matches!(
            data.validate(),
            Err(DataError::UnknownWaveEnemy { .. })
        ));
    }

    #[test]
    fn bundle_round_trips_through_bincode() {
        let data = sample();
        let bytes = bincode::serialize(&data).expect("serialize");
        let restored: GameData = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, data);
    }
}
