//! Placed towers and their range queries.

use std::{sync::Arc, time::Duration};

use ticket_defence_core::{
    CellCoord, GridPoint, TowerSnapshot, TowerTypeDefinition, TowerTypeId, MAX_TOWER_LEVEL,
};

use crate::{
    enemies::Enemy,
    skills::{exponent, levels_above_first, Skill},
};

const RANGE_BONUS_PER_LEVEL: f64 = 0.05;
const DAMAGE_BONUS_PER_LEVEL: f64 = 0.10;
const COOLDOWN_REDUCTION_PER_LEVEL: f64 = 0.05;
const COOLDOWN_FLOOR: f64 = 0.8;
const UPGRADE_COST_SHARE: f64 = 0.7;
const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Price of raising a tower with the provided placement cost from `level`.
#[must_use]
pub fn tower_upgrade_cost(cost: u32, level: u32) -> u32 {
    (f64::from(cost) * UPGRADE_COST_SHARE * UPGRADE_COST_GROWTH.powi(exponent(level))).floor()
        as u32
}

/// Tower instance stored inside the world, keyed by its cell.
#[derive(Clone, Debug)]
pub struct Tower {
    definition: Arc<TowerTypeDefinition>,
    cell: CellCoord,
    level: u32,
    skills: Vec<Skill>,
    active_skill: usize,
    last_attack: Option<Duration>,
}

impl Tower {
    /// Creates a level 1 tower with fresh level 1 skills.
    #[must_use]
    pub fn new(definition: Arc<TowerTypeDefinition>, cell: CellCoord, skills: Vec<Skill>) -> Self {
        Self {
            definition,
            cell,
            level: 1,
            skills,
            active_skill: 0,
            last_attack: None,
        }
    }

    /// Cell occupied by the tower.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Type the tower was built from.
    #[must_use]
    pub fn kind(&self) -> &TowerTypeId {
        &self.definition.id
    }

    /// Shared type definition.
    #[must_use]
    pub fn definition(&self) -> &TowerTypeDefinition {
        &self.definition
    }

    /// Current tower level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Skills in their configured order.
    #[must_use]
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// Index of the active skill, `None` for a tower without skills.
    #[must_use]
    pub fn active_skill_index(&self) -> Option<usize> {
        (self.active_skill < self.skills.len()).then_some(self.active_skill)
    }

    /// Skill used for attacks.
    #[must_use]
    pub fn active_skill(&self) -> Option<&Skill> {
        self.skills.get(self.active_skill)
    }

    /// Switches the active skill. Out-of-range indices are ignored.
    pub fn set_active_skill(&mut self, index: usize) -> bool {
        if index >= self.skills.len() {
            return false;
        }
        self.active_skill = index;
        true
    }

    /// Raises the tower level by one unless the cap was reached.
    pub fn upgrade(&mut self) -> bool {
        if self.level >= MAX_TOWER_LEVEL {
            return false;
        }
        self.level += 1;
        true
    }

    /// Raises one skill by one level.
    pub fn upgrade_skill(&mut self, index: usize) -> bool {
        self.skills.get_mut(index).map_or(false, Skill::upgrade)
    }

    /// Price of the next tower level.
    #[must_use]
    pub fn upgrade_cost(&self) -> u32 {
        tower_upgrade_cost(self.definition.cost, self.level)
    }

    /// Price of the next level of one skill, zero for an invalid index.
    #[must_use]
    pub fn skill_upgrade_cost(&self, index: usize) -> u32 {
        self.skills.get(index).map_or(0, Skill::upgrade_cost)
    }

    /// Range of the active skill including the tower bonus.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.active_skill().map_or(0.0, |skill| {
            skill.range() * (1.0 + levels_above_first(self.level) * RANGE_BONUS_PER_LEVEL)
        })
    }

    /// Damage of the active skill including the tower bonus.
    #[must_use]
    pub fn damage(&self) -> f64 {
        self.active_skill()
            .map_or(0.0, |skill| skill.damage() * self.damage_bonus())
    }

    /// Damage against an enemy carrying `target_tag`, including the tower bonus.
    #[must_use]
    pub fn damage_against(&self, target_tag: &str) -> f64 {
        self.active_skill()
            .map_or(0.0, |skill| skill.damage_against(target_tag) * self.damage_bonus())
    }

    /// Cooldown of the active skill including the tower bonus.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        let millis = self.active_skill().map_or(0, |skill| {
            let factor = (1.0 - levels_above_first(self.level) * COOLDOWN_REDUCTION_PER_LEVEL)
                .max(COOLDOWN_FLOOR);
            (skill.cooldown_ms() as f64 * factor).floor() as u64
        });
        Duration::from_millis(millis)
    }

    /// Reports whether a full cooldown elapsed since the last executed attack.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        self.last_attack
            .map_or(true, |last| now.saturating_sub(last) >= self.cooldown())
    }

    /// Starts a new cooldown. Called exactly once per executed attack.
    pub fn reset_cooldown(&mut self, now: Duration) {
        self.last_attack = Some(now);
    }

    /// Position of the tower in grid units.
    #[must_use]
    pub fn position(&self) -> GridPoint {
        self.cell.to_point()
    }

    /// Alive enemies within range, closest first.
    ///
    /// Enemies at equal distance keep the order in which they were provided.
    pub fn enemies_in_range<'a>(
        &self,
        enemies: impl IntoIterator<Item = &'a Enemy>,
    ) -> Vec<(&'a Enemy, f64)> {
        let origin = self.position();
        let range = self.range();
        let mut found: Vec<(&Enemy, f64)> = enemies
            .into_iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| (enemy, origin.distance(enemy.position())))
            .filter(|(_, distance)| *distance <= range)
            .collect();
        found.sort_by(|left, right| left.1.total_cmp(&right.1));
        found
    }

    /// Closest alive enemy within range.
    pub fn closest_enemy<'a>(
        &self,
        enemies: impl IntoIterator<Item = &'a Enemy>,
    ) -> Option<(&'a Enemy, f64)> {
        self.enemies_in_range(enemies).into_iter().next()
    }

    /// Reports whether a single enemy is alive and within range.
    #[must_use]
    pub fn is_enemy_in_range(&self, enemy: &Enemy) -> bool {
        enemy.is_alive() && self.position().distance(enemy.position()) <= self.range()
    }

    fn damage_bonus(&self) -> f64 {
        1.0 + levels_above_first(self.level) * DAMAGE_BONUS_PER_LEVEL
    }

    pub(crate) fn snapshot(&self, now: Duration) -> TowerSnapshot {
        TowerSnapshot {
            cell: self.cell,
            kind: self.definition.id.clone(),
            level: self.level,
            active_skill: self.active_skill_index(),
            skills: self.skills.iter().map(Skill::snapshot).collect(),
            range: self.range(),
            damage: self.damage(),
            cooldown: self.cooldown(),
            ready: self.is_ready(now),
            upgrade_cost: self.upgrade_cost(),
        }
    }
}
