use std::{collections::BTreeMap, collections::HashSet, time::Duration};

use proptest::prelude::*;
use ticket_defence_core::{
    CellCoord, CellType, CellTypeId, Command, EnemyId, EnemyTypeDefinition, EnemyTypeId, Event,
    GameData, GridPoint, PlacementError, SkillDefinition, SkillId, TowerTypeDefinition,
    TowerTypeId, WaveDefinition, WaveEnemyEntry, WaveId, WaveStatus,
};
use ticket_defence_world::{self as world, query, EnemyIdSource, World};

#[test]
fn replaying_a_script_yields_identical_events() {
    let script = scripted_commands();
    let first = replay(script.clone());
    let second = replay(script);

    assert_eq!(first, second, "replay diverged between runs");

    let spawned: Vec<EnemyId> = first
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(spawned, vec![EnemyId::new(0), EnemyId::new(1), EnemyId::new(2)]);

    let defeated = first
        .iter()
        .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
        .count();
    assert_eq!(defeated, 2);
    assert!(first.contains(&Event::WaveCompleted {
        wave: WaveId::new(1)
    }));
}

#[test]
fn injected_identifier_source_is_used_for_every_spawn() {
    #[derive(Debug)]
    struct Stride(u64);

    impl EnemyIdSource for Stride {
        fn next_id(&mut self) -> EnemyId {
            self.0 += 10;
            EnemyId::new(self.0)
        }
    }

    let mut world = World::with_enemy_ids(game_data(), Box::new(Stride(100))).expect("valid data");
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyTypeId::new("bug"),
            cell: CellCoord::new(1, 1),
            level: 1,
        },
        &mut events,
    );
    world::apply(&mut world, Command::StartWave { wave: WaveId::new(1) }, &mut events);
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        &mut events,
    );

    let ids: Vec<EnemyId> = query::enemy_view(&world).iter().map(|enemy| enemy.id).collect();
    assert_eq!(ids, vec![EnemyId::new(110), EnemyId::new(120)]);
}

#[test]
fn dead_enemies_stay_visible_until_removed() {
    let mut world = World::new(game_data()).expect("valid data");
    let tower = CellCoord::new(0, 0);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerTypeId::new("dev"),
            cell: tower,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyTypeId::new("bug"),
            cell: CellCoord::new(1, 0),
            level: 1,
        },
        &mut events,
    );
    let enemy = EnemyId::new(0);
    world::apply(&mut world, Command::AttackEnemy { tower, enemy }, &mut events);

    let view = query::enemy_view(&world);
    assert_eq!(view.len(), 1);
    assert_eq!(view.alive().count(), 0);

    world::apply(&mut world, Command::RemoveEnemy { enemy }, &mut events);
    assert!(query::enemy_view(&world).is_empty());
    assert_eq!(events.last(), Some(&Event::EnemyRemoved { enemy }));
}

proptest! {
    #[test]
    fn at_most_one_tower_per_cell(cells in proptest::collection::vec((0u32..4, 0u32..7), 1..30)) {
        let mut world = World::new(game_data()).expect("valid data");
        let kind = TowerTypeId::new("dev");
        let mut occupied = HashSet::new();

        for (row, column) in cells {
            let cell = CellCoord::new(row, column);
            let before = query::tower_view(&world).len();
            let result = world.place_tower(&kind, cell).map(|tower| tower.cell());

            if row >= 3 || column >= 6 {
                prop_assert_eq!(result, Err(PlacementError::OutOfBounds));
            } else if occupied.insert(cell) {
                prop_assert_eq!(result, Ok(cell));
            } else {
                prop_assert_eq!(result, Err(PlacementError::Occupied));
            }
            let expected = if occupied.len() > before { before + 1 } else { before };
            prop_assert_eq!(query::tower_view(&world).len(), expected);
        }
    }

    #[test]
    fn range_query_is_sorted_and_bounded(
        positions in proptest::collection::vec((1.0f64..1.99, 0.0f64..5.99), 0..12),
    ) {
        let mut world = World::new(game_data()).expect("valid data");
        let tower = CellCoord::new(0, 2);
        let _ = world.place_tower(&TowerTypeId::new("dev"), tower).expect("placed");
        for (row, column) in &positions {
            let id = world
                .spawn_enemy(&EnemyTypeId::new("bug"), CellCoord::new(1, 0), 1)
                .expect("spawned");
            let _ = world.move_enemy(id, GridPoint::new(*row, *column));
        }

        let found = query::enemies_in_range(&world, tower);
        let range = query::tower(&world, tower).map(|snapshot| snapshot.range).unwrap_or_default();

        prop_assert!(found.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        prop_assert!(found.iter().all(|target| target.distance <= range));
        let inside = query::enemy_view(&world)
            .iter()
            .filter(|enemy| enemy.position.distance(GridPoint::new(0.0, 2.0)) <= range)
            .count();
        prop_assert_eq!(found.len(), inside);
    }
}

fn replay(commands: Vec<Command>) -> Vec<Event> {
    let mut world = World::new(game_data()).expect("valid data");
    let mut events = Vec::new();
    for command in commands {
        let mut generated = Vec::new();
        world::apply(&mut world, command, &mut generated);
        events.extend(generated);
    }

    let waves = query::wave_view(&world).into_vec();
    assert_eq!(waves[0].status, WaveStatus::Completed);
    events
}

fn scripted_commands() -> Vec<Command> {
    let tower = CellCoord::new(0, 1);
    let mut commands = vec![
        Command::PlaceTower {
            kind: TowerTypeId::new("dev"),
            cell: tower,
        },
        Command::SpawnEnemy {
            kind: EnemyTypeId::new("bug"),
            cell: CellCoord::new(1, 5),
            level: 1,
        },
        Command::StartWave { wave: WaveId::new(1) },
    ];
    for step in 0..12u64 {
        commands.push(Command::Tick {
            dt: Duration::from_millis(250),
        });
        for enemy in 0..3 {
            commands.push(Command::AttackEnemy {
                tower,
                enemy: EnemyId::new(enemy),
            });
        }
        if step == 6 {
            commands.push(Command::MoveEnemy {
                enemy: EnemyId::new(0),
                position: GridPoint::new(1.0, 4.5),
            });
        }
    }
    commands
}

fn game_data() -> GameData {
    let wall = CellTypeId::new(0);
    let floor = CellTypeId::new(1);
    GameData {
        map: vec![vec![wall; 6], vec![floor; 6], vec![wall; 6]],
        cell_types: vec![
            CellType {
                id: wall,
                walkable: false,
                visual_tag: String::new(),
            },
            CellType {
                id: floor,
                walkable: true,
                visual_tag: String::new(),
            },
        ],
        tower_types: vec![TowerTypeDefinition {
            id: TowerTypeId::new("dev"),
            label: "Developer".to_owned(),
            cost: 100,
            visual_tag: String::new(),
            skill_ids: vec![SkillId::new("debugging")],
        }],
        skills: vec![SkillDefinition {
            id: SkillId::new("debugging"),
            name: "debugging".to_owned(),
            label: "Debugging".to_owned(),
            base_damage: 50.0,
            base_range: 2.5,
            base_cooldown_ms: 200,
            target_type: None,
            effect_modifier: 1.0,
            max_level: 10,
            description: String::new(),
            visual_tag: String::new(),
        }],
        enemy_types: vec![EnemyTypeDefinition {
            id: EnemyTypeId::new("bug"),
            target_tag: "backend".to_owned(),
            label: "Bug".to_owned(),
            base_health: 40.0,
            speed: 1.0,
            base_reward: 3,
            resistance: BTreeMap::new(),
            visual_tag: String::new(),
        }],
        initial_towers: Vec::new(),
        waves: vec![WaveDefinition {
            id: WaveId::new(1),
            name: None,
            spawn_interval_ms: 500,
            spawn_points: vec![CellCoord::new(1, 0)],
            enemies: vec![
                WaveEnemyEntry {
                    kind: EnemyTypeId::new("bug"),
                    level: 1,
                    spawn_point: 0,
                },
                WaveEnemyEntry {
                    kind: EnemyTypeId::new("bug"),
                    level: 1,
                    spawn_point: 0,
                },
            ],
        }],
    }
}
