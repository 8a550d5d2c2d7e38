//! Leveled attack profiles owned by towers.

use std::{sync::Arc, time::Duration};

use ticket_defence_core::{SkillDefinition, SkillId, SkillSnapshot};

const DAMAGE_GROWTH_PER_LEVEL: f64 = 0.20;
const RANGE_GROWTH_PER_LEVEL: f64 = 0.10;
const COOLDOWN_REDUCTION_PER_LEVEL: f64 = 0.08;
const COOLDOWN_FLOOR: f64 = 0.5;
const UPGRADE_BASE_COST: f64 = 50.0;
const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Damage dealt by a skill of the provided base damage at `level`.
#[must_use]
pub fn scaled_damage(base_damage: f64, level: u32) -> f64 {
    base_damage * (1.0 + levels_above_first(level) * DAMAGE_GROWTH_PER_LEVEL)
}

/// Range of a skill of the provided base range at `level`.
#[must_use]
pub fn scaled_range(base_range: f64, level: u32) -> f64 {
    base_range * (1.0 + levels_above_first(level) * RANGE_GROWTH_PER_LEVEL)
}

/// Cooldown in whole milliseconds of a skill at `level`.
///
/// Shrinks by 8% per level and never drops below half of the base.
#[must_use]
pub fn scaled_cooldown_ms(base_cooldown_ms: u64, level: u32) -> u64 {
    let factor = (1.0 - levels_above_first(level) * COOLDOWN_REDUCTION_PER_LEVEL).max(COOLDOWN_FLOOR);
    (base_cooldown_ms as f64 * factor).floor() as u64
}

/// Price of raising a skill from `level` to the next level.
#[must_use]
pub fn skill_upgrade_cost(level: u32) -> u32 {
    (UPGRADE_BASE_COST * UPGRADE_COST_GROWTH.powi(exponent(level))).floor() as u32
}

pub(crate) fn levels_above_first(level: u32) -> f64 {
    f64::from(level.saturating_sub(1))
}

pub(crate) fn exponent(level: u32) -> i32 {
    i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX)
}

/// Skill instance exclusively owned by one tower.
#[derive(Clone, Debug)]
pub struct Skill {
    definition: Arc<SkillDefinition>,
    level: u32,
}

impl Skill {
    /// Creates a level 1 instance of the shared definition.
    #[must_use]
    pub fn new(definition: Arc<SkillDefinition>) -> Self {
        Self {
            definition,
            level: 1,
        }
    }

    /// Shared definition the instance was built from.
    #[must_use]
    pub fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    /// Identifier of the skill, also the resistance tag of its damage.
    #[must_use]
    pub fn id(&self) -> &SkillId {
        &self.definition.id
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Raises the level by one unless the cap was reached.
    pub fn upgrade(&mut self) -> bool {
        if self.level >= self.definition.max_level {
            return false;
        }
        self.level += 1;
        true
    }

    /// Level-scaled damage.
    #[must_use]
    pub fn damage(&self) -> f64 {
        scaled_damage(self.definition.base_damage, self.level)
    }

    /// Level-scaled range in grid units.
    #[must_use]
    pub fn range(&self) -> f64 {
        scaled_range(self.definition.base_range, self.level)
    }

    /// Level-scaled cooldown in whole milliseconds.
    #[must_use]
    pub fn cooldown_ms(&self) -> u64 {
        scaled_cooldown_ms(self.definition.base_cooldown_ms, self.level)
    }

    /// Damage against an enemy carrying `target_tag`.
    ///
    /// The effect modifier applies only when the tag equals the skill's target type.
    #[must_use]
    pub fn damage_against(&self, target_tag: &str) -> f64 {
        let modifier = match self.definition.target_type.as_deref() {
            Some(target_type) if target_type == target_tag => self.definition.effect_modifier,
            _ => 1.0,
        };
        self.damage() * modifier
    }

    /// Price of the next level.
    #[must_use]
    pub fn upgrade_cost(&self) -> u32 {
        skill_upgrade_cost(self.level)
    }

    pub(crate) fn snapshot(&self) -> SkillSnapshot {
        SkillSnapshot {
            id: self.definition.id.clone(),
            level: self.level,
            max_level: self.definition.max_level,
            damage: self.damage(),
            range: self.range(),
            cooldown: Duration::from_millis(self.cooldown_ms()),
            upgrade_cost: self.upgrade_cost(),
        }
    }
}

#[cfg(test)]
pub(crate) fn definition(id: &str, damage: f64, range: f64, cooldown_ms: u64) -> SkillDefinition {
    SkillDefinition {
        id: SkillId::new(id),
        name: id.to_owned(),
        label: id.to_owned(),
        base_damage: damage,
        base_range: range,
        base_cooldown_ms: cooldown_ms,
        target_type: None,
        effect_modifier: ticket_defence_core::DEFAULT_EFFECT_MODIFIER,
        max_level: ticket_defence_core::DEFAULT_MAX_SKILL_LEVEL,
        description: String::new(),
        visual_tag: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn damage_grows_twenty_percent_per_level() {
        let expected = [10.0, 12.0, 14.0, 16.0, 18.0];
        for (index, value) in expected.iter().enumerate() {
            let level = index as u32 + 1;
            assert!((scaled_damage(10.0, level) - value).abs() < 1e-9);
        }
    }

    #[test]
    fn range_grows_ten_percent_per_level() {
        assert_eq!(scaled_range(3.0, 1), 3.0);
        assert!((scaled_range(3.0, 2) - 3.3).abs() < 1e-9);
        assert!((scaled_range(5.0, 11) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cooldown_shrinks_until_half_of_base() {
        let observed: Vec<u64> = (1..=8).map(|level| scaled_cooldown_ms(100, level)).collect();
        assert_eq!(observed, vec![100, 92, 84, 76, 68, 60, 52, 50]);
        assert_eq!(scaled_cooldown_ms(1_000, 2), 920);
        assert_eq!(scaled_cooldown_ms(1_000, 20), 500);
    }

    #[test]
    fn upgrade_cost_grows_geometrically() {
        let observed: Vec<u32> = (1..=5).map(skill_upgrade_cost).collect();
        assert_eq!(observed, vec![50, 75, 112, 168, 253]);
    }

    #[test]
    fn effect_modifier_applies_to_matching_tag_only() {
        let mut definition = definition("html_css", 10.0, 3.0, 1_000);
        definition.target_type = Some("frontend".to_owned());
        definition.effect_modifier = 1.5;
        let skill = Skill::new(Arc::new(definition));

        assert!((skill.damage_against("frontend") - 15.0).abs() < 1e-9);
        assert!((skill.damage_against("backend") - 10.0).abs() < 1e-9);
    }

    #[test]
    fn upgrade_stops_at_max_level() {
        let mut definition = definition("sql", 8.0, 2.0, 1_500);
        definition.max_level = 4;
        let mut skill = Skill::new(Arc::new(definition));

        let successes = (0..4).filter(|_| skill.upgrade()).count();

        assert_eq!(successes, 3);
        assert_eq!(skill.level(), 4);
        assert!(!skill.upgrade());
        assert_eq!(skill.level(), 4);
    }

    proptest! {
        #[test]
        fn cooldown_never_drops_below_half_of_base(base in 0u64..100_000, level in 1u32..200) {
            let cooldown = scaled_cooldown_ms(base, level);
            prop_assert!(cooldown >= base / 2);
            prop_assert!(cooldown <= base);
        }

        #[test]
        fn upgrading_max_level_times_succeeds_max_level_minus_one_times(max_level in 1u32..40) {
            let mut definition = definition("api", 1.0, 1.0, 100);
            definition.max_level = max_level;
            let mut skill = Skill::new(Arc::new(definition));

            let outcomes: Vec<bool> = (0..max_level).map(|_| skill.upgrade()).collect();

            prop_assert_eq!(outcomes.iter().filter(|ok| **ok).count() as u32, max_level - 1);
            prop_assert!(!outcomes[outcomes.len() - 1]);
            prop_assert_eq!(skill.level(), max_level);
        }
    }
}
