#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Ticket Defence.

mod catalog;
mod enemies;
mod grid;
mod skills;
mod towers;
mod waves;

use std::{sync::Arc, time::Duration};

use ticket_defence_core::{
    AttackError, CellCoord, CellType, CellTypeId, Command, DamageOutcome, DataError, EnemyId,
    EnemyTypeDefinition, EnemyTypeId, Event, GameData, GridPoint, PlacementError, RemovalError,
    SkillDefinition, SkillId, SpawnError, TowerTypeDefinition, TowerTypeId, UpgradeError,
    WaveError, WaveId, WaveStatus, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

pub use catalog::Catalog;
pub use enemies::{scaled_health, Enemy, EnemyIdSource, SequentialEnemyIds};
pub use grid::{Cell, Grid};
pub use skills::{scaled_cooldown_ms, scaled_damage, scaled_range, skill_upgrade_cost, Skill};
pub use towers::{tower_upgrade_cost, Tower};
pub use waves::Wave;

/// Result of an executed attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackReport {
    /// Health removed from the enemy.
    pub damage: f64,
    /// Whether this hit defeated the enemy.
    pub defeated: bool,
    /// Reward granted by the hit; zero unless `defeated`.
    pub reward: u32,
}

/// Represents the authoritative Ticket Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    cell_types: Catalog<CellTypeId, CellType>,
    skills: Catalog<SkillId, SkillDefinition>,
    tower_types: Catalog<TowerTypeId, TowerTypeDefinition>,
    enemy_types: Catalog<EnemyTypeId, EnemyTypeDefinition>,
    towers: Vec<Tower>,
    enemies: Vec<Enemy>,
    waves: Vec<Wave>,
    enemy_ids: Box<dyn EnemyIdSource + Send>,
    now: Duration,
    tick_index: u64,
}

impl World {
    /// Builds a world from a game-data bundle with sequential enemy identifiers.
    pub fn new(data: GameData) -> Result<Self, DataError> {
        Self::with_enemy_ids(data, Box::new(SequentialEnemyIds::default()))
    }

    /// Builds a world from a game-data bundle using the provided identifier source.
    ///
    /// Any unresolved identifier, invalid spawn point or rejected initial tower
    /// aborts construction.
    pub fn with_enemy_ids(
        data: GameData,
        enemy_ids: Box<dyn EnemyIdSource + Send>,
    ) -> Result<Self, DataError> {
        let _ = data.validate()?;
        let GameData {
            map,
            cell_types,
            tower_types,
            skills,
            enemy_types,
            initial_towers,
            waves,
        } = data;

        let cell_types = Catalog::new(cell_types, |cell_type| cell_type.id);
        let grid = Grid::build(&map, &cell_types)?;
        let skills = Catalog::new(skills, |skill| skill.id.clone());
        let tower_types = Catalog::new(tower_types, |tower_type| tower_type.id.clone());
        for tower_type in tower_types.iter() {
            if let Some(skill) = tower_type
                .skill_ids
                .iter()
                .find(|skill| skills.get(skill).is_none())
            {
                return Err(DataError::UnknownSkill {
                    tower_type: tower_type.id.clone(),
                    skill: skill.clone(),
                });
            }
        }
        let enemy_types = Catalog::new(enemy_types, |enemy_type| enemy_type.id.clone());

        let waves = waves
            .iter()
            .map(|definition| Wave::new(definition, &enemy_types))
            .collect::<Result<Vec<_>, _>>()?;
        for wave in &waves {
            if let Some(cell) = wave
                .spawn_points()
                .iter()
                .find(|cell| !grid.is_walkable(**cell))
            {
                return Err(DataError::InvalidSpawnPoint {
                    wave: wave.id(),
                    cell: *cell,
                });
            }
        }

        let mut world = Self {
            banner: WELCOME_BANNER,
            grid,
            cell_types,
            skills,
            tower_types,
            enemy_types,
            towers: Vec::new(),
            enemies: Vec::new(),
            waves,
            enemy_ids,
            now: Duration::ZERO,
            tick_index: 0,
        };

        for tower in initial_towers {
            match world.place_tower(&tower.kind, tower.position) {
                Ok(_) => {}
                Err(PlacementError::UnknownTowerType) => {
                    return Err(DataError::UnknownTowerType(tower.kind));
                }
                Err(reason) => {
                    return Err(DataError::InitialTowerRejected {
                        kind: tower.kind,
                        cell: tower.position,
                        reason,
                    });
                }
            }
        }

        let dimensions = world.grid.dimensions();
        info!(
            rows = dimensions.rows(),
            columns = dimensions.columns(),
            towers = world.towers.len(),
            waves = world.waves.len(),
            "world constructed"
        );
        Ok(world)
    }

    /// Places a tower with fresh level 1 skills on an unoccupied in-bounds cell.
    pub fn place_tower(
        &mut self,
        kind: &TowerTypeId,
        cell: CellCoord,
    ) -> Result<&Tower, PlacementError> {
        let Some(definition) = self.tower_types.get(kind) else {
            return Err(PlacementError::UnknownTowerType);
        };
        if !self.grid.dimensions().contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if self.tower_at(cell).is_some() {
            return Err(PlacementError::Occupied);
        }

        let skills = definition
            .skill_ids
            .iter()
            .filter_map(|id| self.skills.get(id))
            .map(|skill| Skill::new(Arc::clone(skill)))
            .collect();
        let tower = Tower::new(Arc::clone(definition), cell, skills);
        debug!(kind = %kind, %cell, "tower placed");
        self.towers.push(tower);
        let index = self.towers.len() - 1;
        Ok(&self.towers[index])
    }

    /// Removes the tower standing on `cell`.
    pub fn remove_tower(&mut self, cell: CellCoord) -> Option<Tower> {
        let index = self.towers.iter().position(|tower| tower.cell() == cell)?;
        debug!(%cell, "tower removed");
        Some(self.towers.remove(index))
    }

    /// Tower standing on `cell`.
    #[must_use]
    pub fn tower_at(&self, cell: CellCoord) -> Option<&Tower> {
        self.towers.iter().find(|tower| tower.cell() == cell)
    }

    fn tower_at_mut(&mut self, cell: CellCoord) -> Option<&mut Tower> {
        self.towers.iter_mut().find(|tower| tower.cell() == cell)
    }

    /// Towers in placement order.
    #[must_use]
    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// Raises the level of the tower on `cell`, returning the new level.
    pub fn upgrade_tower(&mut self, cell: CellCoord) -> Result<u32, UpgradeError> {
        let tower = self.tower_at_mut(cell).ok_or(UpgradeError::MissingTower)?;
        if !tower.upgrade() {
            return Err(UpgradeError::MaxLevel);
        }
        Ok(tower.level())
    }

    /// Raises one skill of the tower on `cell`, returning the skill's new level.
    pub fn upgrade_skill(&mut self, cell: CellCoord, skill: usize) -> Result<u32, UpgradeError> {
        let tower = self.tower_at_mut(cell).ok_or(UpgradeError::MissingTower)?;
        if skill >= tower.skills().len() {
            return Err(UpgradeError::InvalidSkill);
        }
        if !tower.upgrade_skill(skill) {
            return Err(UpgradeError::MaxLevel);
        }
        Ok(tower.skills()[skill].level())
    }

    /// Switches the active skill of the tower on `cell`.
    pub fn set_active_skill(&mut self, cell: CellCoord, skill: usize) -> bool {
        self.tower_at_mut(cell)
            .map_or(false, |tower| tower.set_active_skill(skill))
    }

    /// Spawns an enemy outside of any wave on a walkable cell.
    pub fn spawn_enemy(
        &mut self,
        kind: &EnemyTypeId,
        cell: CellCoord,
        level: u32,
    ) -> Result<EnemyId, SpawnError> {
        let result = self.try_spawn_enemy(kind, cell, level);
        if let Err(reason) = &result {
            warn!(kind = %kind, %cell, level, %reason, "enemy spawn rejected");
        }
        result
    }

    fn try_spawn_enemy(
        &mut self,
        kind: &EnemyTypeId,
        cell: CellCoord,
        level: u32,
    ) -> Result<EnemyId, SpawnError> {
        if level == 0 {
            return Err(SpawnError::InvalidLevel);
        }
        let definition = self
            .enemy_types
            .get(kind)
            .ok_or(SpawnError::UnknownEnemyType)?;
        if !self.grid.dimensions().contains(cell) {
            return Err(SpawnError::OutOfBounds);
        }
        if !self.grid.is_walkable(cell) {
            return Err(SpawnError::NotWalkable);
        }

        let enemy = Enemy::new(
            self.enemy_ids.next_id(),
            Arc::clone(definition),
            cell,
            level,
        );
        let id = enemy.id();
        debug!(enemy = %id, kind = %kind, %cell, level, "enemy spawned");
        self.enemies.push(enemy);
        Ok(id)
    }

    /// Enemy with the provided identifier, alive or dead.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id() == id)
    }

    /// Enemies in spawn order, including dead ones awaiting removal.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Enemies that are alive right now.
    pub fn alive_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|enemy| enemy.is_alive())
    }

    /// Removes an enemy from the active collection.
    ///
    /// A living wave enemy is released from its wave without counting as defeated.
    pub fn remove_enemy(&mut self, id: EnemyId) -> Option<Enemy> {
        let index = self.enemies.iter().position(|enemy| enemy.id() == id)?;
        let mut enemy = self.enemies.remove(index);
        if let Some(wave) = enemy.wave() {
            if let Some(wave) = self.waves.iter_mut().find(|candidate| candidate.id() == wave) {
                let _ = wave.forget_enemy(id);
            }
        }
        enemy.mark_removed();
        debug!(enemy = %id, "enemy removed");
        Some(enemy)
    }

    /// Relocates a living enemy, returning its previous position.
    ///
    /// The destination must lie on a walkable cell.
    pub fn move_enemy(&mut self, id: EnemyId, position: GridPoint) -> Option<GridPoint> {
        let cell = position.containing_cell()?;
        if !self.grid.is_walkable(cell) {
            return None;
        }
        let enemy = self
            .enemies
            .iter_mut()
            .find(|enemy| enemy.id() == id && enemy.is_alive())?;
        Some(enemy.relocate(position))
    }

    /// Lets the tower on `tower_cell` hit `enemy` with its active skill.
    ///
    /// Rejected attacks leave the tower's cooldown untouched. A defeat is
    /// reported to the wave that spawned the enemy.
    pub fn attack(
        &mut self,
        tower_cell: CellCoord,
        enemy: EnemyId,
    ) -> Result<AttackReport, AttackError> {
        let now = self.now;
        let tower_index = self
            .towers
            .iter()
            .position(|tower| tower.cell() == tower_cell)
            .ok_or(AttackError::MissingTower)?;
        let enemy_index = self
            .enemies
            .iter()
            .position(|candidate| candidate.id() == enemy)
            .ok_or(AttackError::MissingEnemy)?;

        let tower = &mut self.towers[tower_index];
        let target = &mut self.enemies[enemy_index];
        let skill_tag = tower
            .active_skill()
            .map(|skill| skill.id().clone())
            .ok_or(AttackError::NoActiveSkill)?;
        if !target.is_alive() {
            return Err(AttackError::EnemyDead);
        }
        if !tower.is_ready(now) {
            return Err(AttackError::NotReady);
        }
        if !tower.is_enemy_in_range(target) {
            return Err(AttackError::OutOfRange);
        }

        let before = target.health();
        let damage = tower.damage_against(target.target_tag());
        let outcome = target.apply_damage(damage, Some(&skill_tag));
        tower.reset_cooldown(now);
        let report = AttackReport {
            damage: before - target.health(),
            defeated: outcome == DamageOutcome::Killed,
            reward: if outcome == DamageOutcome::Killed {
                target.reward()
            } else {
                0
            },
        };

        if report.defeated {
            if let Some(wave) = self
                .waves
                .iter_mut()
                .find(|wave| wave.active_enemies().contains(&enemy))
            {
                let _ = wave.notify_enemy_defeated(enemy);
            }
            info!(enemy = %enemy, tower = %tower_cell, reward = report.reward, "enemy defeated");
        }
        Ok(report)
    }

    /// Alive enemies within range of the tower on `tower_cell`, closest first.
    #[must_use]
    pub fn enemies_in_range(&self, tower_cell: CellCoord) -> Vec<(&Enemy, f64)> {
        self.tower_at(tower_cell)
            .map(|tower| tower.enemies_in_range(&self.enemies))
            .unwrap_or_default()
    }

    /// Closest alive enemy within range of the tower on `tower_cell`.
    #[must_use]
    pub fn closest_enemy(&self, tower_cell: CellCoord) -> Option<(&Enemy, f64)> {
        self.tower_at(tower_cell)?.closest_enemy(&self.enemies)
    }

    /// Reports whether `enemy` is alive and within range of the tower on `tower_cell`.
    #[must_use]
    pub fn is_enemy_in_range(&self, tower_cell: CellCoord, enemy: EnemyId) -> bool {
        match (self.tower_at(tower_cell), self.enemy(enemy)) {
            (Some(tower), Some(enemy)) => tower.is_enemy_in_range(enemy),
            _ => false,
        }
    }

    /// Starts a configured wave at the current simulation time.
    pub fn start_wave(&mut self, id: WaveId) -> Result<(), WaveError> {
        let now = self.now;
        let wave = self
            .waves
            .iter_mut()
            .find(|wave| wave.id() == id)
            .ok_or(WaveError::UnknownWave)?;
        wave.start(now)?;
        info!(wave = %id, name = wave.name(), "wave started");
        Ok(())
    }

    /// Configured waves in declaration order.
    #[must_use]
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Simulation time accumulated from applied ticks.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.now = self.now.saturating_add(dt);
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt, now: self.now });

        let now = self.now;
        for wave in self.waves.iter_mut() {
            let was_completed = wave.status() == WaveStatus::Completed;
            if let Some(enemy) = wave.update(now, &mut *self.enemy_ids) {
                debug!(enemy = %enemy.id(), wave = %wave.id(), "wave enemy spawned");
                out_events.push(Event::EnemySpawned {
                    enemy: enemy.id(),
                    kind: enemy.kind().clone(),
                    cell: enemy.spawn_cell(),
                    wave: Some(wave.id()),
                });
                self.enemies.push(enemy);
            }
            if !was_completed && wave.status() == WaveStatus::Completed {
                info!(wave = %wave.id(), name = wave.name(), "wave completed");
                out_events.push(Event::WaveCompleted { wave: wave.id() });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance(dt, out_events),
        Command::PlaceTower { kind, cell } => match world.place_tower(&kind, cell) {
            Ok(_) => out_events.push(Event::TowerPlaced { kind, cell }),
            Err(reason) => out_events.push(Event::TowerPlacementRejected { kind, cell, reason }),
        },
        Command::RemoveTower { cell } => match world.remove_tower(cell) {
            Some(tower) => out_events.push(Event::TowerRemoved {
                kind: tower.kind().clone(),
                cell,
            }),
            None => out_events.push(Event::TowerRemovalRejected {
                cell,
                reason: RemovalError::MissingTower,
            }),
        },
        Command::UpgradeTower { cell } => match world.upgrade_tower(cell) {
            Ok(level) => out_events.push(Event::TowerUpgraded { cell, level }),
            Err(reason) => out_events.push(Event::UpgradeRejected { cell, reason }),
        },
        Command::UpgradeSkill { cell, skill } => match world.upgrade_skill(cell, skill) {
            Ok(level) => out_events.push(Event::SkillUpgraded { cell, skill, level }),
            Err(reason) => out_events.push(Event::UpgradeRejected { cell, reason }),
        },
        Command::SetActiveSkill { cell, skill } => {
            if world.set_active_skill(cell, skill) {
                out_events.push(Event::ActiveSkillChanged { cell, skill });
            } else {
                debug!(%cell, skill, "active skill change ignored");
            }
        }
        Command::SpawnEnemy { kind, cell, level } => {
            match world.spawn_enemy(&kind, cell, level) {
                Ok(enemy) => out_events.push(Event::EnemySpawned {
                    enemy,
                    kind,
                    cell,
                    wave: None,
                }),
                Err(reason) => out_events.push(Event::EnemySpawnRejected { kind, cell, reason }),
            }
        }
        Command::MoveEnemy { enemy, position } => {
            if let Some(from) = world.move_enemy(enemy, position) {
                out_events.push(Event::EnemyMoved {
                    enemy,
                    from,
                    to: position,
                });
            }
        }
        Command::AttackEnemy { tower, enemy } => match world.attack(tower, enemy) {
            Ok(report) => {
                out_events.push(Event::TowerAttacked {
                    tower,
                    enemy,
                    damage: report.damage,
                });
                if report.defeated {
                    out_events.push(Event::EnemyDefeated {
                        enemy,
                        tower,
                        reward: report.reward,
                    });
                }
            }
            Err(reason) => out_events.push(Event::AttackRejected {
                tower,
                enemy,
                reason,
            }),
        },
        Command::RemoveEnemy { enemy } => {
            if world.remove_enemy(enemy).is_some() {
                out_events.push(Event::EnemyRemoved { enemy });
            }
        }
        Command::StartWave { wave } => match world.start_wave(wave) {
            Ok(()) => out_events.push(Event::WaveStarted { wave }),
            Err(reason) => out_events.push(Event::WaveStartRejected { wave, reason }),
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Catalog, Grid, World};
    use ticket_defence_core::{
        CellCoord, CellType, CellTypeId, EnemyId, EnemySnapshot, EnemyTypeDefinition,
        EnemyTypeId, EnemyView, GridDimensions, SkillDefinition, SkillId, TowerSnapshot,
        TowerTarget, TowerTypeDefinition, TowerTypeId, TowerView, WaveView,
    };

    /// Read-only state handed to renderers once per render callback.
    #[derive(Debug)]
    pub struct Snapshot<'a> {
        /// Map cells.
        pub grid: &'a Grid,
        /// Map dimensions.
        pub dimensions: GridDimensions,
        /// Terrain categories.
        pub cell_types: &'a Catalog<CellTypeId, CellType>,
        /// Towers in placement order.
        pub towers: TowerView,
        /// Tower type definitions.
        pub tower_types: &'a Catalog<TowerTypeId, TowerTypeDefinition>,
        /// Skill definitions.
        pub skills: &'a Catalog<SkillId, SkillDefinition>,
        /// Enemies in spawn order, including dead ones awaiting removal.
        pub enemies: EnemyView,
        /// Enemy type definitions.
        pub enemy_types: &'a Catalog<EnemyTypeId, EnemyTypeDefinition>,
        /// Configured waves.
        pub waves: WaveView,
        /// Simulation time.
        pub now: Duration,
    }

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures everything a renderer needs.
    #[must_use]
    pub fn snapshot(world: &World) -> Snapshot<'_> {
        Snapshot {
            grid: &world.grid,
            dimensions: world.grid.dimensions(),
            cell_types: &world.cell_types,
            towers: tower_view(world),
            tower_types: &world.tower_types,
            skills: &world.skills,
            enemies: enemy_view(world),
            enemy_types: &world.enemy_types,
            waves: wave_view(world),
            now: world.now,
        }
    }

    /// Map dimensions in cells.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.grid.dimensions()
    }

    /// Simulation time accumulated from applied ticks.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(world.now))
                .collect(),
        )
    }

    /// Snapshot of the tower standing on `cell`.
    #[must_use]
    pub fn tower(world: &World, cell: CellCoord) -> Option<TowerSnapshot> {
        world.tower_at(cell).map(|tower| tower.snapshot(world.now))
    }

    /// Captures a read-only view of the enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Snapshot of one enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemy(id).map(|enemy| enemy.snapshot())
    }

    /// Captures a read-only view of the configured waves.
    #[must_use]
    pub fn wave_view(world: &World) -> WaveView {
        WaveView::from_snapshots(world.waves.iter().map(|wave| wave.snapshot()).collect())
    }

    /// Alive enemies within range of the tower on `cell`, closest first.
    #[must_use]
    pub fn enemies_in_range(world: &World, cell: CellCoord) -> Vec<TowerTarget> {
        world
            .enemies_in_range(cell)
            .into_iter()
            .map(|(enemy, distance)| TowerTarget {
                tower: cell,
                enemy: enemy.id(),
                distance,
            })
            .collect()
    }

    /// Closest alive enemy in range for every tower that has one, in placement order.
    #[must_use]
    pub fn tower_targets(world: &World) -> Vec<TowerTarget> {
        world
            .towers
            .iter()
            .filter_map(|tower| {
                tower
                    .closest_enemy(&world.enemies)
                    .map(|(enemy, distance)| TowerTarget {
                        tower: tower.cell(),
                        enemy: enemy.id(),
                        distance,
                    })
            })
            .collect()
    }
}
