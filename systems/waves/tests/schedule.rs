use std::time::Duration;

use ticket_defence_core::{Command, Event, GameData, WaveId};
use ticket_defence_system_waves::{Config, WaveSchedule};
use ticket_defence_world::{self as world, query, World};

const GAME: &str = r#"{
    "map": [[0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0]],
    "cellTypes": [
        { "id": 0, "walkable": false },
        { "id": 1, "walkable": true }
    ],
    "towerTypes": [ { "id": "dev", "label": "Developer", "cost": 100, "skills": ["debugging"] } ],
    "skills": [
        { "id": "debugging", "name": "debugging", "damage": 50, "range": 2.5, "cooldown": 200 }
    ],
    "enemyTypes": [ { "id": "bug", "type": "backend", "health": 40, "reward": 3 } ],
    "initialTowers": [ { "type": "dev", "position": { "row": 0, "col": 0 } } ],
    "waves": [
        { "id": 1, "name": "Sprint 1", "spawnInterval": 500,
          "spawnPoints": [ { "row": 1, "col": 0 } ], "enemies": [ { "type": "bug" } ] },
        { "id": 2, "name": "Sprint 2", "spawnInterval": 500,
          "spawnPoints": [ { "row": 1, "col": 1 } ], "enemies": [ { "type": "bug" } ] }
    ]
}"#;

#[derive(Debug, PartialEq)]
struct Timed {
    now: Duration,
    event: Event,
}

fn run(ticks: usize) -> (Vec<Timed>, bool) {
    let data: GameData = serde_json::from_str(GAME).expect("game data parses");
    let mut world = World::new(data).expect("valid data");
    let mut schedule = WaveSchedule::new(Config::new(Duration::ZERO, Duration::from_secs(1)));
    let mut log = Vec::new();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    for _ in 0..ticks {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        schedule.handle(&events, &query::wave_view(&world), &mut commands);
        for target in query::tower_targets(&world) {
            commands.push(Command::AttackEnemy {
                tower: target.tower,
                enemy: target.enemy,
            });
        }
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }

        let now = query::now(&world);
        log.extend(events.drain(..).map(|event| Timed { now, event }));
    }

    let exhausted = schedule.is_exhausted(&query::wave_view(&world));
    (log, exhausted)
}

fn time_of(log: &[Timed], wanted: &Event) -> Duration {
    log.iter()
        .find(|entry| &entry.event == wanted)
        .map(|entry| entry.now)
        .unwrap_or_else(|| panic!("missing event {wanted:?}"))
}

#[test]
fn waves_run_in_order_separated_by_the_configured_delay() {
    let (log, exhausted) = run(40);
    assert!(exhausted, "both waves should be completed");

    let first_started = time_of(&log, &Event::WaveStarted { wave: WaveId::new(1) });
    let first_completed = time_of(&log, &Event::WaveCompleted { wave: WaveId::new(1) });
    let second_started = time_of(&log, &Event::WaveStarted { wave: WaveId::new(2) });
    let second_completed = time_of(&log, &Event::WaveCompleted { wave: WaveId::new(2) });

    assert_eq!(first_started, Duration::from_millis(100));
    assert!(first_started < first_completed);
    assert!(second_started >= first_completed + Duration::from_secs(1));
    assert!(second_started < second_completed);
}

#[test]
fn nothing_is_started_twice() {
    let (log, _) = run(60);
    let starts = log
        .iter()
        .filter(|entry| matches!(entry.event, Event::WaveStarted { .. }))
        .count();
    let rejections = log
        .iter()
        .filter(|entry| matches!(entry.event, Event::WaveStartRejected { .. }))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(rejections, 0);
}
