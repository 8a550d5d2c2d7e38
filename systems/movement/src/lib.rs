#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement driver that walks enemies along the walkable corridor.
//!
//! The world only validates relocations; this system plans a route from each
//! enemy's spawn cell by following unvisited walkable neighbours and proposes
//! `Command::MoveEnemy` as simulated time advances. Enemies that reach the end
//! of their route stay there.

use std::collections::HashMap;

use ticket_defence_core::{
    CellCoord, Command, EnemyId, EnemySnapshot, EnemyView, Event, GridDimensions, GridPoint,
};

const POSITION_EPSILON: f64 = 1e-9;

/// Pure system that reacts to time events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    routes: HashMap<EnemyId, Route>,
    visited: Vec<bool>,
}

impl Movement {
    /// Creates a movement system without planned routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and the enemy view to emit movement commands.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        dimensions: GridDimensions,
        is_walkable: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> bool,
    {
        let elapsed: f64 = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt, .. } => Some(dt.as_secs_f64()),
                _ => None,
            })
            .sum();

        self.routes
            .retain(|id, _| enemies.alive().any(|enemy| enemy.id == *id));

        if elapsed <= 0.0 {
            return;
        }

        for enemy in enemies.alive() {
            if !self.routes.contains_key(&enemy.id) {
                let route = self.plan(enemy.spawn_cell, dimensions, &is_walkable);
                let _ = self.routes.insert(enemy.id, route);
            }
            let Some(route) = self.routes.get_mut(&enemy.id) else {
                continue;
            };
            if let Some(position) = route.advance(enemy, elapsed) {
                out.push(Command::MoveEnemy {
                    enemy: enemy.id,
                    position,
                });
            }
        }
    }

    /// Number of enemies with a planned route.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.routes.len()
    }

    fn plan<F>(&mut self, start: CellCoord, dimensions: GridDimensions, is_walkable: &F) -> Route
    where
        F: Fn(CellCoord) -> bool,
    {
        let columns = dimensions.columns() as usize;
        let cell_count = dimensions.rows() as usize * columns;
        self.visited.clear();
        self.visited.resize(cell_count, false);

        let index = |cell: CellCoord| cell.row() as usize * columns + cell.column() as usize;
        let mut cells = vec![start];
        if dimensions.contains(start) {
            self.visited[index(start)] = true;
        }

        let mut current = start;
        while let Some(next) = neighbours(current)
            .into_iter()
            .flatten()
            .find(|cell| {
                dimensions.contains(*cell) && !self.visited[index(*cell)] && is_walkable(*cell)
            })
        {
            self.visited[index(next)] = true;
            cells.push(next);
            current = next;
        }

        Route {
            cells,
            travelled: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Route {
    cells: Vec<CellCoord>,
    travelled: f64,
}

impl Route {
    fn advance(&mut self, enemy: &EnemySnapshot, elapsed: f64) -> Option<GridPoint> {
        let last = self.cells.len().saturating_sub(1) as f64;
        self.travelled = (self.travelled + enemy.speed.max(0.0) * elapsed).min(last);
        let position = self.position();
        let moved = (position.row - enemy.position.row).abs() > POSITION_EPSILON
            || (position.column - enemy.position.column).abs() > POSITION_EPSILON;
        moved.then_some(position)
    }

    fn position(&self) -> GridPoint {
        let step = self.travelled.floor();
        let fraction = self.travelled - step;
        let index = step as usize;
        let from = self.cells[index.min(self.cells.len() - 1)].to_point();
        let Some(to) = self.cells.get(index + 1).map(|cell| cell.to_point()) else {
            return from;
        };
        GridPoint::new(
            from.row + (to.row - from.row) * fraction,
            from.column + (to.column - from.column) * fraction,
        )
    }
}

/// Right, down, left, up.
fn neighbours(cell: CellCoord) -> [Option<CellCoord>; 4] {
    let (row, column) = (cell.row(), cell.column());
    [
        column.checked_add(1).map(|column| CellCoord::new(row, column)),
        row.checked_add(1).map(|row| CellCoord::new(row, column)),
        column.checked_sub(1).map(|column| CellCoord::new(row, column)),
        row.checked_sub(1).map(|row| CellCoord::new(row, column)),
    ]
}
