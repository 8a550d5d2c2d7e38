//! Spawned hostile units.

use std::sync::Arc;

use ticket_defence_core::{
    CellCoord, DamageOutcome, EnemyId, EnemyLifecycle, EnemySnapshot, EnemyTypeDefinition,
    EnemyTypeId, GridPoint, SkillId, WaveId,
};

use crate::skills::exponent;

const HEALTH_GROWTH_PER_LEVEL: f64 = 1.2;
const MINIMUM_DAMAGE: f64 = 1.0;

/// Health of an enemy of the provided base health at `level`.
#[must_use]
pub fn scaled_health(base_health: f64, level: u32) -> f64 {
    base_health * HEALTH_GROWTH_PER_LEVEL.powi(exponent(level))
}

/// Source of unique enemy identifiers.
pub trait EnemyIdSource: std::fmt::Debug {
    /// Allocates the identifier for the next enemy.
    fn next_id(&mut self) -> EnemyId;
}

/// Monotonic counter starting at zero.
#[derive(Clone, Debug, Default)]
pub struct SequentialEnemyIds {
    next: u64,
}

impl SequentialEnemyIds {
    /// Creates a counter whose first identifier is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl EnemyIdSource for SequentialEnemyIds {
    fn next_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Enemy instance tracked by the world.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    definition: Arc<EnemyTypeDefinition>,
    spawn_cell: CellCoord,
    position: GridPoint,
    level: u32,
    health: f64,
    reward: u32,
    lifecycle: EnemyLifecycle,
    wave: Option<WaveId>,
}

impl Enemy {
    /// Creates a living enemy with full health standing on `cell`.
    #[must_use]
    pub fn new(
        id: EnemyId,
        definition: Arc<EnemyTypeDefinition>,
        cell: CellCoord,
        level: u32,
    ) -> Self {
        let level = level.max(1);
        Self {
            id,
            health: scaled_health(definition.base_health, level),
            reward: definition.base_reward.saturating_mul(level),
            definition,
            spawn_cell: cell,
            position: cell.to_point(),
            level,
            lifecycle: EnemyLifecycle::Spawned,
            wave: None,
        }
    }

    pub(crate) fn from_wave(mut self, wave: WaveId) -> Self {
        self.wave = Some(wave);
        self
    }

    /// Identifier allocated at spawn.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Type the enemy was spawned from.
    #[must_use]
    pub fn kind(&self) -> &EnemyTypeId {
        &self.definition.id
    }

    /// Shared type definition.
    #[must_use]
    pub fn definition(&self) -> &EnemyTypeDefinition {
        &self.definition
    }

    /// Tag compared against a skill's target type.
    #[must_use]
    pub fn target_tag(&self) -> &str {
        &self.definition.target_tag
    }

    /// Cell the enemy appeared on.
    #[must_use]
    pub const fn spawn_cell(&self) -> CellCoord {
        self.spawn_cell
    }

    /// Current position in grid units.
    #[must_use]
    pub const fn position(&self) -> GridPoint {
        self.position
    }

    /// Difficulty level fixed at spawn.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Remaining health, never negative.
    #[must_use]
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Health at spawn, derived from the level on every call.
    #[must_use]
    pub fn max_health(&self) -> f64 {
        scaled_health(self.definition.base_health, self.level)
    }

    /// Remaining health as a percentage of the maximum.
    #[must_use]
    pub fn health_percentage(&self) -> f64 {
        let max_health = self.max_health();
        if max_health <= 0.0 {
            return 0.0;
        }
        100.0 * self.health / max_health
    }

    /// Reward granted when defeated, fixed at spawn.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> EnemyLifecycle {
        self.lifecycle
    }

    /// Reports whether the enemy is alive and targetable.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.lifecycle == EnemyLifecycle::Spawned
    }

    /// Wave that produced the enemy, if any.
    #[must_use]
    pub const fn wave(&self) -> Option<WaveId> {
        self.wave
    }

    /// Applies one hit.
    ///
    /// A resistance registered for `skill_tag` scales the amount down, after
    /// which at least one point of health is removed. Dead enemies are left
    /// untouched and report [`DamageOutcome::AlreadyDead`].
    pub fn apply_damage(&mut self, amount: f64, skill_tag: Option<&SkillId>) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::AlreadyDead;
        }

        let mut amount = amount;
        if let Some(resistance) = skill_tag.and_then(|tag| self.definition.resistance.get(tag)) {
            if *resistance > 0.0 {
                amount *= 1.0 - resistance;
            }
        }
        let amount = if amount.is_nan() {
            MINIMUM_DAMAGE
        } else {
            amount.max(MINIMUM_DAMAGE)
        };

        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.lifecycle = EnemyLifecycle::Dead;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Survived
        }
    }

    pub(crate) fn relocate(&mut self, position: GridPoint) -> GridPoint {
        std::mem::replace(&mut self.position, position)
    }

    pub(crate) fn mark_removed(&mut self) {
        self.lifecycle = EnemyLifecycle::Removed;
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.definition.id.clone(),
            spawn_cell: self.spawn_cell,
            position: self.position,
            speed: self.definition.speed,
            level: self.level,
            health: self.health,
            max_health: self.max_health(),
            lifecycle: self.lifecycle,
            reward: self.reward,
            wave: self.wave,
        }
    }
}

#[cfg(test)]
pub(crate) fn definition(id: &str, target_tag: &str, health: f64) -> EnemyTypeDefinition {
    EnemyTypeDefinition {
        id: EnemyTypeId::new(id),
        target_tag: target_tag.to_owned(),
        label: id.to_owned(),
        base_health: health,
        speed: 1.0,
        base_reward: 10,
        resistance: std::collections::BTreeMap::new(),
        visual_tag: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enemy(health: f64, level: u32) -> Enemy {
        let mut definition = definition("frontend_ticket", "frontend", health);
        let _ = definition.resistance.insert(SkillId::new("html_css"), 0.2);
        Enemy::new(EnemyId::new(1), Arc::new(definition), CellCoord::new(0, 0), level)
    }

    #[test]
    fn health_grows_twenty_percent_per_level() {
        assert!((scaled_health(100.0, 1) - 100.0).abs() < 1e-9);
        assert!((scaled_health(100.0, 2) - 120.0).abs() < 1e-9);
        assert!((scaled_health(100.0, 3) - 144.0).abs() < 1e-9);
    }

    #[test]
    fn reward_scales_with_level() {
        assert_eq!(enemy(100.0, 3).reward(), 30);
    }

    #[test]
    fn resistance_reduces_tagged_damage() {
        let mut enemy = enemy(100.0, 1);

        let outcome = enemy.apply_damage(10.0, Some(&SkillId::new("html_css")));

        assert_eq!(outcome, DamageOutcome::Survived);
        assert!((enemy.health() - 92.0).abs() < 1e-9);
    }

    #[test]
    fn untagged_damage_ignores_resistance() {
        let mut enemy = enemy(100.0, 1);
        let _ = enemy.apply_damage(10.0, None);
        assert!((enemy.health() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_hits_remove_at_least_one_point() {
        let mut enemy = enemy(100.0, 1);
        let _ = enemy.apply_damage(0.1, Some(&SkillId::new("html_css")));
        assert!((enemy.health() - 99.0).abs() < 1e-9);
    }

    #[test]
    fn death_is_reported_once() {
        let mut enemy = enemy(5.0, 1);

        assert_eq!(enemy.apply_damage(50.0, None), DamageOutcome::Killed);
        assert_eq!(enemy.health(), 0.0);
        assert_eq!(enemy.lifecycle(), EnemyLifecycle::Dead);
        assert_eq!(enemy.apply_damage(50.0, None), DamageOutcome::AlreadyDead);
        assert_eq!(enemy.health(), 0.0);
        assert_eq!(enemy.health_percentage(), 0.0);
    }

    #[test]
    fn sequential_ids_are_monotonic() {
        let mut ids = SequentialEnemyIds::starting_at(7);
        assert_eq!(ids.next_id(), EnemyId::new(7));
        assert_eq!(ids.next_id(), EnemyId::new(8));
    }

    proptest! {
        #[test]
        fn every_hit_on_a_living_enemy_removes_at_least_one_point(
            hits in proptest::collection::vec(0.0f64..50.0, 1..40),
        ) {
            let mut enemy = enemy(200.0, 2);
            let mut kills = 0;
            for hit in hits {
                let before = enemy.health();
                let was_alive = enemy.is_alive();
                match enemy.apply_damage(hit, Some(&SkillId::new("html_css"))) {
                    DamageOutcome::Killed => kills += 1,
                    DamageOutcome::Survived => {}
                    DamageOutcome::AlreadyDead => prop_assert!(!was_alive),
                }
                prop_assert!(enemy.health() >= 0.0);
                if was_alive {
                    prop_assert!(before - enemy.health() >= 1.0 - 1e-9 || enemy.health() == 0.0);
                } else {
                    prop_assert_eq!(enemy.health(), before);
                }
            }
            prop_assert!(kills <= 1);
            prop_assert_eq!(kills == 1, !enemy.is_alive());
        }
    }
}
