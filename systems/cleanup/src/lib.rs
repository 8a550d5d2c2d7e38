#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that retires defeated enemies after they were presented once.

use ticket_defence_core::{Command, EnemyLifecycle, EnemyView};

/// Emits removal commands for dead enemies at the first tick of each new frame.
///
/// Run it before the tick's own combat so enemies killed during a frame are
/// still part of that frame's render and leave on the next one.
#[derive(Debug, Default)]
pub struct Cleanup {
    last_frame: Option<u64>,
}

impl Cleanup {
    /// Creates a new cleanup system that has not observed any frame yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `Command::RemoveEnemy` for every dead enemy when `frame` is new.
    pub fn handle(&mut self, frame: u64, enemies: &EnemyView, out: &mut Vec<Command>) {
        if self.last_frame == Some(frame) {
            return;
        }
        self.last_frame = Some(frame);

        out.extend(
            enemies
                .iter()
                .filter(|enemy| enemy.lifecycle == EnemyLifecycle::Dead)
                .map(|enemy| Command::RemoveEnemy { enemy: enemy.id }),
        );
    }
}
