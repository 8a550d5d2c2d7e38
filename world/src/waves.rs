//! Timed spawn schedules.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use ticket_defence_core::{
    CellCoord, DataError, EnemyId, EnemyTypeDefinition, EnemyTypeId, WaveDefinition, WaveError,
    WaveId, WaveSnapshot, WaveStatus,
};

use crate::{
    catalog::Catalog,
    enemies::{Enemy, EnemyIdSource},
};

#[derive(Clone, Debug)]
struct PendingSpawn {
    definition: Arc<EnemyTypeDefinition>,
    level: u32,
    spawn_point: usize,
}

/// Wave instance moving through `Inactive -> Active -> Completed`.
#[derive(Clone, Debug)]
pub struct Wave {
    id: WaveId,
    name: String,
    spawn_points: Vec<CellCoord>,
    spawn_interval: Duration,
    pending: VecDeque<PendingSpawn>,
    active: Vec<EnemyId>,
    last_spawn: Duration,
    status: WaveStatus,
    defeated: usize,
    total: usize,
}

impl Wave {
    /// Resolves every scheduled enemy type up front.
    pub(crate) fn new(
        definition: &WaveDefinition,
        enemy_types: &Catalog<EnemyTypeId, EnemyTypeDefinition>,
    ) -> Result<Self, DataError> {
        if definition.spawn_points.is_empty() {
            return Err(DataError::MissingSpawnPoints(definition.id));
        }

        let pending = definition
            .enemies
            .iter()
            .map(|entry| {
                enemy_types
                    .get(&entry.kind)
                    .map(|enemy_type| PendingSpawn {
                        definition: Arc::clone(enemy_type),
                        level: entry.level,
                        spawn_point: entry.spawn_point,
                    })
                    .ok_or_else(|| DataError::UnknownWaveEnemy {
                        wave: definition.id,
                        enemy_type: entry.kind.clone(),
                    })
            })
            .collect::<Result<VecDeque<_>, _>>()?;

        Ok(Self {
            id: definition.id,
            name: definition.display_name(),
            spawn_points: definition.spawn_points.clone(),
            spawn_interval: Duration::from_millis(definition.spawn_interval_ms),
            total: pending.len(),
            pending,
            active: Vec::new(),
            last_spawn: Duration::ZERO,
            status: WaveStatus::Inactive,
            defeated: 0,
        })
    }

    /// Identifier of the wave.
    #[must_use]
    pub const fn id(&self) -> WaveId {
        self.id
    }

    /// Display name of the wave.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// State machine position.
    #[must_use]
    pub const fn status(&self) -> WaveStatus {
        self.status
    }

    /// Begins spawning; the first spawn follows one interval after `now`.
    pub fn start(&mut self, now: Duration) -> Result<(), WaveError> {
        if self.status != WaveStatus::Inactive {
            return Err(WaveError::AlreadyStarted);
        }
        self.status = WaveStatus::Active;
        self.last_spawn = now;
        Ok(())
    }

    /// Advances the schedule, releasing at most one enemy.
    ///
    /// Completion is re-evaluated on every call and only reached once nothing
    /// is pending and every spawned enemy was defeated.
    pub fn update(&mut self, now: Duration, ids: &mut dyn EnemyIdSource) -> Option<Enemy> {
        if self.status != WaveStatus::Active {
            return None;
        }

        if !self.pending.is_empty() {
            if now.saturating_sub(self.last_spawn) < self.spawn_interval {
                return None;
            }
            let spawn = self.pending.pop_front()?;
            let cell = self
                .spawn_points
                .get(spawn.spawn_point)
                .or_else(|| self.spawn_points.first())
                .copied()?;
            let enemy = Enemy::new(ids.next_id(), spawn.definition, cell, spawn.level)
                .from_wave(self.id);
            self.active.push(enemy.id());
            self.last_spawn = now;
            return Some(enemy);
        }

        if self.active.is_empty() {
            self.status = WaveStatus::Completed;
        }
        None
    }

    /// Records a defeat. Enemies not spawned by this wave are ignored.
    pub fn notify_enemy_defeated(&mut self, enemy: EnemyId) -> bool {
        let Some(index) = self.active.iter().position(|id| *id == enemy) else {
            return false;
        };
        let _ = self.active.remove(index);
        self.defeated += 1;
        true
    }

    /// Stops tracking an enemy that left the board without being defeated.
    pub(crate) fn forget_enemy(&mut self, enemy: EnemyId) -> bool {
        let Some(index) = self.active.iter().position(|id| *id == enemy) else {
            return false;
        };
        let _ = self.active.remove(index);
        true
    }

    /// Defeated share of the wave, in percent.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.defeated as f64 / self.total as f64
    }

    /// Spawned enemies not defeated yet.
    #[must_use]
    pub fn active_enemies(&self) -> &[EnemyId] {
        &self.active
    }

    pub(crate) fn spawn_points(&self) -> &[CellCoord] {
        &self.spawn_points
    }

    pub(crate) fn snapshot(&self) -> WaveSnapshot {
        WaveSnapshot {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            pending: self.pending.len(),
            active: self.active.len(),
            defeated: self.defeated,
            total: self.total,
            progress: self.progress(),
        }
    }
}
