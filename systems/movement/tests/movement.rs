use std::time::Duration;

use ticket_defence_core::{CellCoord, Command, EnemyTypeId, Event, GameData, GridPoint};
use ticket_defence_system_movement::Movement;
use ticket_defence_world::{self as world, query, World};

const GAME: &str = r#"{
    "map": [[1, 1, 1, 0], [0, 0, 1, 0], [0, 0, 1, 1]],
    "cellTypes": [
        { "id": 0, "walkable": false },
        { "id": 1, "walkable": true }
    ],
    "enemyTypes": [ { "id": "bug", "type": "backend", "health": 40, "speed": 2.0 } ]
}"#;

fn run(ticks: usize) -> (World, Vec<Event>) {
    let data: GameData = serde_json::from_str(GAME).expect("game data parses");
    let mut world = World::new(data).expect("valid data");
    let mut movement = Movement::new();
    let mut events = Vec::new();
    let mut log = Vec::new();
    let mut commands = Vec::new();

    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyTypeId::new("bug"),
            cell: CellCoord::new(0, 0),
            level: 1,
        },
        &mut log,
    );

    for _ in 0..ticks {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        let snapshot = query::snapshot(&world);
        movement.handle(
            &events,
            &snapshot.enemies,
            snapshot.dimensions,
            |cell| snapshot.grid.is_walkable(cell),
            &mut commands,
        );
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        log.append(&mut events);
    }
    (world, log)
}

#[test]
fn world_accepts_every_step_along_the_corridor() {
    let (world, log) = run(20);

    let moves: Vec<GridPoint> = log
        .iter()
        .filter_map(|event| match event {
            Event::EnemyMoved { to, .. } => Some(*to),
            _ => None,
        })
        .collect();

    assert_eq!(moves.len(), 10, "five cells at two cells per second");
    assert_eq!(moves.first(), Some(&GridPoint::new(0.0, 0.5)));
    assert_eq!(moves.last(), Some(&GridPoint::new(2.0, 3.0)));

    let enemy = query::enemy_view(&world)
        .into_vec()
        .pop()
        .expect("enemy still present");
    assert_eq!(enemy.position, GridPoint::new(2.0, 3.0));
}

#[test]
fn movement_replay_is_deterministic() {
    assert_eq!(run(12).1, run(12).1);
}
