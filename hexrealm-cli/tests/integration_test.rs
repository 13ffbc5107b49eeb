//! Integration tests for HEXREALM
//!
//! Tests the full stack: board search, combat, turn lifecycle, persistence
//! and the script runner

use hexrealm_cli::run_script;
use hexrealm_core::{
    ActionError, Board, BuildingId, GameConfig, Hex, ImprovementKind, Player, PlayerId,
    Resources, Selection, TargetOutcome, Terrain, TurnEngine, UnitId, UnitKind, World,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Hand-built game on a uniform board; players start with default stock
fn custom_game(rows: u32, cols: u32, terrain: Terrain, players: u8) -> TurnEngine {
    let config = GameConfig::default().with_board(rows, cols).with_seed(99);
    let mut world = World::new(
        Board::uniform(rows, cols, terrain),
        config.clone(),
        ChaCha8Rng::seed_from_u64(99),
    );
    let roster: Vec<PlayerId> = (1..=players).map(PlayerId).collect();
    for &id in &roster {
        world.add_player(Player::new(id, config.starting_resources));
    }
    TurnEngine::from_parts(world, roster, 0, 1)
}

/// Generated game whose first warrior has stepped off its city
fn game_with_free_warrior() -> (TurnEngine, UnitId, BuildingId) {
    for seed in 0..64 {
        let config = GameConfig::default().with_board(8, 8).with_seed(seed);
        let mut engine = TurnEngine::new_game(&config).unwrap();
        let me = engine.current_player_id().unwrap();
        let player = engine.world().player(me).unwrap();
        let unit = *player.units.iter().next().unwrap();
        let city = *player.buildings.iter().next().unwrap();
        let home = engine.world().city(city).unwrap().position;

        engine.target_tile(Some(home)).unwrap();
        let step = engine
            .highlights()
            .reachable
            .iter()
            .copied()
            .filter(|&h| h != home)
            .min();
        if let Some(step) = step {
            if engine.target_tile(Some(step)).is_ok() {
                return (engine, unit, city);
            }
        }
    }
    panic!("no seed left the warrior room to move");
}

fn unit_snapshot(engine: &TurnEngine) -> Vec<(Hex, UnitKind, PlayerId, i32, u32, bool, bool)> {
    let mut units: Vec<_> = engine
        .world()
        .units()
        .map(|u| {
            (
                u.position,
                u.kind,
                u.owner,
                u.hp,
                u.movement,
                u.can_attack,
                u.is_dug_in,
            )
        })
        .collect();
    units.sort_by_key(|u| (u.0, u.2));
    units
}

fn assert_back_references(engine: &TurnEngine) {
    let world = engine.world();
    for unit in world.units() {
        assert_eq!(world.board().tile_at(unit.position).unwrap().unit, Some(unit.id));
        assert!(world.player(unit.owner).unwrap().units.contains(&unit.id));
    }
    for city in world.cities() {
        assert_eq!(world.board().tile_at(city.position).unwrap().building, Some(city.id));
        assert!(world.player(city.owner).unwrap().buildings.contains(&city.id));
    }
}

// ============================================================================
// GEOMETRY AND SEARCH
// ============================================================================

#[test]
fn test_distance_properties() {
    let hexes: Vec<Hex> = (-3..=3)
        .flat_map(|q| (-3..=3).map(move |r| Hex::axial(q, r)))
        .collect();
    for &a in &hexes {
        assert_eq!(a.distance_to(a), 0);
        for &b in &hexes {
            assert_eq!(a.distance_to(b), b.distance_to(a));
        }
    }
}

#[test]
fn test_path_endpoints_and_cost_on_mixed_board() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let board = Board::generate(6, 6, &mut rng);
    let hexes: Vec<Hex> = board.tiles().map(|t| t.hex).collect();
    for &start in hexes.iter().take(6) {
        for &goal in hexes.iter().rev().take(6) {
            let path = board.find_path(start, goal).unwrap();
            assert_eq!(path.tiles.first(), Some(&start));
            assert_eq!(path.tiles.last(), Some(&goal));
            let summed: u32 = path.tiles[1..]
                .iter()
                .map(|&h| board.tile_at(h).unwrap().terrain.movement_cost())
                .sum();
            assert_eq!(path.cost, summed);
        }
    }
}

#[test]
fn test_grass_three_by_three_scenario() {
    let mut engine = custom_game(3, 3, Terrain::Grass, 2);
    let path = engine
        .board()
        .find_path(Hex::axial(0, 0), Hex::axial(2, 0))
        .unwrap();
    assert_eq!(path.tiles.len(), 3);
    assert_eq!(path.cost, 2);
    assert_eq!(engine.current_round(), 1);
    assert_eq!(
        engine.target_tile(Some(Hex::axial(1, 1))).unwrap(),
        TargetOutcome::Inspected(Hex::axial(1, 1))
    );
}

#[test]
fn test_zero_budget_reaches_only_origin() {
    let board = Board::uniform(4, 4, Terrain::Sand);
    let origin = Hex::axial(1, 1);
    let reachable = board.reachable_tiles(origin, 0, false, 0);
    assert_eq!(reachable.len(), 1);
    assert!(reachable.contains(&origin));
}

// ============================================================================
// COMBAT AND MOVEMENT THROUGH THE ENGINE
// ============================================================================

#[test]
fn test_attack_at_exact_range_then_out_of_range() {
    let mut world = World::new(
        Board::uniform(1, 9, Terrain::Grass),
        GameConfig::default(),
        ChaCha8Rng::seed_from_u64(1),
    );
    world.add_player(Player::new(PlayerId(1), Resources::ZERO));
    world.add_player(Player::new(PlayerId(2), Resources::ZERO));
    world.spawn_unit(UnitKind::Crossbowman, PlayerId(1), Hex::axial(0, 0)).unwrap();
    world.spawn_unit(UnitKind::Crossbowman, PlayerId(1), Hex::axial(8, 0)).unwrap();
    world.spawn_unit(UnitKind::Warrior, PlayerId(2), Hex::axial(3, 0)).unwrap();
    world.spawn_unit(UnitKind::Warrior, PlayerId(2), Hex::axial(4, 0)).unwrap();
    let mut engine = TurnEngine::from_parts(world, vec![PlayerId(1), PlayerId(2)], 0, 1);

    engine.target_tile(Some(Hex::axial(0, 0))).unwrap();
    assert!(matches!(
        engine.target_tile(Some(Hex::axial(3, 0))).unwrap(),
        TargetOutcome::Attacked(_)
    ));

    engine.target_tile(Some(Hex::axial(8, 0))).unwrap();
    assert_eq!(
        engine.target_tile(Some(Hex::axial(4, 0))),
        Err(ActionError::OutOfRange {
            distance: 4,
            range: 3
        })
    );
}

#[test]
fn test_mountain_detour_and_block() {
    // mountain in the middle of row 0: too dear to enter with 3 movement,
    // but the far side is reachable around it
    let mut world = World::new(
        Board::from_tiles(
            3,
            3,
            Board::uniform(3, 3, Terrain::Grass).tiles().map(|t| {
                let terrain = if t.hex == Hex::axial(1, 0) {
                    Terrain::Mountain
                } else {
                    Terrain::Grass
                };
                (t.hex, terrain)
            }),
        )
        .unwrap(),
        GameConfig::default(),
        ChaCha8Rng::seed_from_u64(0),
    );
    world.add_player(Player::new(PlayerId(1), Resources::ZERO));
    world.add_player(Player::new(PlayerId(2), Resources::ZERO));
    let unit = world
        .spawn_unit(UnitKind::Warrior, PlayerId(1), Hex::axial(0, 0))
        .unwrap();
    let mut engine = TurnEngine::from_parts(world, vec![PlayerId(1), PlayerId(2)], 0, 1);

    engine.target_tile(Some(Hex::axial(0, 0))).unwrap();
    assert!(!engine.highlights().reachable.contains(&Hex::axial(1, 0)));
    assert!(engine.highlights().reachable.contains(&Hex::axial(2, 0)));

    match engine.target_tile(Some(Hex::axial(2, 0))).unwrap() {
        TargetOutcome::Moved { cost, .. } => assert_eq!(cost, 3),
        other => panic!("expected a move, got {other:?}"),
    }
    let moved = engine.world().unit(unit).unwrap();
    assert_eq!(moved.position, Hex::axial(2, 0));
    assert_eq!(moved.movement, 0);
}

#[test]
fn test_moving_onto_occupied_tile_always_fails() {
    let mut world = World::new(
        Board::uniform(3, 3, Terrain::Grass),
        GameConfig::default(),
        ChaCha8Rng::seed_from_u64(3),
    );
    world.add_player(Player::new(PlayerId(1), Resources::ZERO));
    world.add_player(Player::new(PlayerId(2), Resources::ZERO));
    let a = world.spawn_unit(UnitKind::Warrior, PlayerId(1), Hex::axial(0, 0)).unwrap();
    world.spawn_unit(UnitKind::Warrior, PlayerId(1), Hex::axial(1, 0)).unwrap();
    assert_eq!(
        world.move_unit(a, Hex::axial(1, 0)),
        Err(ActionError::TileOccupied(Hex::axial(1, 0)))
    );
    assert_eq!(world.unit(a).unwrap().movement, 3);
}

// ============================================================================
// ROUND LIFECYCLE
// ============================================================================

#[test]
fn test_elimination_to_game_over() {
    let mut world = World::new(
        Board::uniform(5, 5, Terrain::Grass),
        GameConfig::default(),
        ChaCha8Rng::seed_from_u64(4),
    );
    let stock = GameConfig::default().starting_resources;
    world.add_player(Player::new(PlayerId(1), stock));
    world.add_player(Player::new(PlayerId(2), stock));
    let center = Hex::axial(1, 2);
    let target = world.spawn_unit(UnitKind::Warrior, PlayerId(2), center).unwrap();
    let attackers: Vec<Hex> = center.neighbors().take(4).collect();
    for &hex in &attackers {
        world.spawn_unit(UnitKind::Warrior, PlayerId(1), hex).unwrap();
    }
    let mut engine = TurnEngine::from_parts(world, vec![PlayerId(1), PlayerId(2)], 0, 1);

    // four hits of at least 25 finish a 100 hp warrior
    for &hex in &attackers {
        if engine.world().unit(target).is_none() {
            break;
        }
        engine.target_tile(Some(hex)).unwrap();
        assert!(matches!(
            engine.target_tile(Some(center)).unwrap(),
            TargetOutcome::Attacked(_)
        ));
    }
    assert!(engine.world().unit(target).is_none());
    assert!(engine.world().player(PlayerId(2)).unwrap().is_defeated());

    engine.end_turn().unwrap();
    assert!(!engine.is_game_over());
    engine.end_turn().unwrap();

    assert!(engine.is_game_over());
    assert_eq!(engine.roster(), &[PlayerId(1)]);
    assert_eq!(engine.game_over_message(), "Game over! Player 1 wins!");
    // four units, no city, 6020 stock
    assert_eq!(engine.player_scores().get(&PlayerId(1)), Some(&622));
}

#[test]
fn test_round_end_refreshes_every_survivor() {
    let (mut engine, unit, _) = game_with_free_warrior();
    assert!(engine.world().unit(unit).unwrap().movement < 3);
    engine.end_turn().unwrap();
    engine.end_turn().unwrap();
    assert_eq!(engine.current_round(), 2);
    for u in engine.world().units() {
        assert_eq!(u.movement, u.max_movement);
        assert!(u.can_attack);
    }
}

#[test]
fn test_improvement_completes_across_rounds() {
    let (mut engine, _, city) = game_with_free_warrior();
    let home = engine.world().city(city).unwrap().position;
    engine.target_tile(Some(home)).unwrap();
    assert_eq!(engine.selection(), Selection::BuildingSelected(city));
    engine.start_improvement(ImprovementKind::Farm).unwrap();

    for _ in 0..3 {
        engine.end_turn().unwrap();
        engine.end_turn().unwrap();
    }
    let c = engine.world().city(city).unwrap();
    assert!(c.has_improvement(ImprovementKind::Farm));
    assert!(c.improvement.is_none());
    assert_eq!(engine.world().food_storage(c.owner), 150);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_save_and_load_mid_improvement() {
    let (mut engine, _, city) = game_with_free_warrior();
    let home = engine.world().city(city).unwrap().position;
    engine.target_tile(Some(home)).unwrap();
    engine.start_improvement(ImprovementKind::Mine).unwrap();
    engine.end_turn().unwrap();
    engine.end_turn().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mid.json");
    engine.save_game(&path).unwrap();

    let mut loaded = TurnEngine::new_game(&GameConfig::default().with_board(4, 4).with_seed(1)).unwrap();
    loaded.load_game(&path).unwrap();

    let before = engine.world().city(city).unwrap();
    let after = loaded.world().city_at(home).unwrap();
    assert_eq!(after.hp, before.hp);
    assert_eq!(after.completed, before.completed);
    assert_eq!(after.improvement, before.improvement);
    assert_eq!(
        after.improvement.map(|o| o.kind),
        Some(ImprovementKind::Mine)
    );

    assert_eq!(unit_snapshot(&loaded), unit_snapshot(&engine));
    assert_eq!(loaded.current_round(), engine.current_round());
    assert_eq!(loaded.current_player_id(), engine.current_player_id());
    assert_eq!(loaded.selection(), Selection::SelectingEntity);
    assert_back_references(&loaded);
}

#[test]
fn test_failed_load_keeps_current_game() {
    let (mut engine, _, _) = game_with_free_warrior();
    let snapshot = unit_snapshot(&engine);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"board": {"rows": 1, "cols": 1, "tiles": []}}"#).unwrap();
    assert!(engine.load_game(&path).is_err());
    assert!(engine.load_game(&dir.path().join("missing.json")).is_err());

    assert_eq!(unit_snapshot(&engine), snapshot);
    assert_eq!(engine.current_round(), 1);
}

// ============================================================================
// SCRIPTS
// ============================================================================

#[test]
fn test_script_save_end_load_round_trip() {
    let config = GameConfig::default().with_board(6, 6).with_seed(12);
    let mut engine = TurnEngine::new_game(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.json");

    let script = format!(
        "# pass both turns, then rewind\nsave {p}\nend\nend\nload {p}\n",
        p = path.display()
    );
    let transcript = run_script(&mut engine, &script).unwrap();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[2], "round 2: Player 1 to move");
    assert_eq!(engine.current_round(), 1);
    assert_eq!(engine.current_player_id(), Some(PlayerId(1)));
}

#[test]
fn test_script_reports_rejections_and_continues() {
    let config = GameConfig::default().with_board(6, 6).with_seed(12);
    let mut engine = TurnEngine::new_game(&config).unwrap();
    let transcript = run_script(&mut engine, "dig\nmiss\nfound\nend\n").unwrap();
    assert_eq!(
        transcript,
        vec![
            "rejected: nothing is selected".to_string(),
            "rejected: target is outside the grid".to_string(),
            "rejected: no selected city to act from".to_string(),
            "round 1: Player 2 to move".to_string(),
        ]
    );
}

#[test]
fn test_script_load_failure_aborts() {
    let config = GameConfig::default().with_board(6, 6).with_seed(12);
    let mut engine = TurnEngine::new_game(&config).unwrap();
    let err = run_script(&mut engine, "end\nload /nonexistent/save.json\nend\n").unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
    assert_eq!(engine.current_player_id(), Some(PlayerId(2)));
}
