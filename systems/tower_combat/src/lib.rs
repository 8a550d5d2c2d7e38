#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits attack commands from targeting data.

use ticket_defence_core::{CellCoord, Command, TowerTarget, TowerView};

/// Tower combat system that queues attacks for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    ready: Vec<CellCoord>,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::AttackEnemy` for every target whose tower is ready and armed.
    ///
    /// Targets are expected to carry at most one entry per tower; duplicates
    /// are forwarded and rejected by the world once the cooldown restarts.
    pub fn handle(&mut self, towers: &TowerView, targets: &[TowerTarget], out: &mut Vec<Command>) {
        if targets.is_empty() || towers.is_empty() {
            return;
        }

        self.ready.clear();
        self.ready.extend(
            towers
                .iter()
                .filter(|tower| tower.ready && tower.active_skill.is_some())
                .map(|tower| tower.cell),
        );
        if self.ready.is_empty() {
            return;
        }
        self.ready.sort_unstable();

        self.scratch.clear();
        for target in targets {
            if self.ready.binary_search(&target.tower).is_ok() {
                self.scratch.push(Command::AttackEnemy {
                    tower: target.tower,
                    enemy: target.enemy,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ticket_defence_core::{EnemyId, TowerSnapshot, TowerTypeId};

    #[test]
    fn no_targets_is_silent() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(0, 1, true)]);
        let mut out = Vec::new();

        system.handle(&towers, &[], &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn ready_towers_attack_their_targets() {
        let mut system = TowerCombat::new();
        let towers =
            TowerView::from_snapshots(vec![snapshot(2, 0, true), snapshot(0, 5, true)]);
        let targets = vec![target(2, 0, 4), target(0, 5, 1)];
        let mut out = Vec::new();

        system.handle(&towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::AttackEnemy {
                    tower: CellCoord::new(2, 0),
                    enemy: EnemyId::new(4),
                },
                Command::AttackEnemy {
                    tower: CellCoord::new(0, 5),
                    enemy: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn cooling_unarmed_or_missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let mut unarmed = snapshot(4, 4, true);
        unarmed.active_skill = None;
        let towers = TowerView::from_snapshots(vec![
            snapshot(0, 3, false),
            snapshot(0, 8, true),
            unarmed,
        ]);
        let targets = vec![target(0, 3, 9), target(0, 8, 2), target(4, 4, 6), target(7, 7, 3)];
        let mut out = Vec::new();

        system.handle(&towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::AttackEnemy {
                tower: CellCoord::new(0, 8),
                enemy: EnemyId::new(2),
            }],
        );
    }

    fn snapshot(row: u32, column: u32, ready: bool) -> TowerSnapshot {
        TowerSnapshot {
            cell: CellCoord::new(row, column),
            kind: TowerTypeId::new("frontend_dev"),
            level: 1,
            active_skill: Some(0),
            skills: Vec::new(),
            range: 3.0,
            damage: 10.0,
            cooldown: Duration::from_millis(1_000),
            ready,
            upgrade_cost: 70,
        }
    }

    fn target(row: u32, column: u32, enemy: u64) -> TowerTarget {
        TowerTarget {
            tower: CellCoord::new(row, column),
            enemy: EnemyId::new(enemy),
            distance: 1.0,
        }
    }
}
