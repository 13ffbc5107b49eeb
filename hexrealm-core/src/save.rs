//! Save documents
//!
//! A game is written as one JSON object: the board as a flat tile list with
//! entities nested in their tile, the player ledgers, and the turn state.
//! Entity ids are not persisted; loading hands out fresh ones.
//!
//! Loading runs in passes: players first, then the bare board, then every
//! entity is created, bound to its owner and dropped onto its tile.

use crate::blueprint::{BuildingKind, ImprovementKind, UnitKind};
use crate::board::Board;
use crate::city::ProductionOrder;
use crate::config::GameConfig;
use crate::engine::TurnEngine;
use crate::error::PersistenceError;
use crate::hex::{CubeRecord, Hex};
use crate::ids::PlayerId;
use crate::player::Player;
use crate::resources::Resources;
use crate::terrain::Terrain;
use crate::world::{rng_from_config, World};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub board: BoardRecord,
    pub players: Vec<PlayerRecord>,
    pub current_player_id: Option<PlayerId>,
    pub current_round: u32,
    pub game_over: bool,
    #[serde(default)]
    pub game_over_message: String,
    #[serde(default)]
    pub player_scores: BTreeMap<PlayerId, u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub rows: u32,
    pub cols: u32,
    pub tiles: Vec<TileRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
    pub terrain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<BuildingRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: CubeRecord,
    pub hp: i32,
    pub current_movement_range: u32,
    pub can_attack: bool,
    pub is_dug_in: bool,
    pub player_id: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: CubeRecord,
    pub hp: i32,
    pub player_id: PlayerId,
    #[serde(default = "default_true")]
    pub can_attack: bool,
    #[serde(default)]
    pub completed_improvements: Vec<String>,
    #[serde(default)]
    pub improvement_in_progress: Option<OrderRecord>,
    #[serde(default)]
    pub recruitment_in_progress: Option<OrderRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub turns_remaining: u32,
    pub committed: Resources,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub resources: Resources,
    pub income: Resources,
    pub expense: Resources,
    pub camera_x: f64,
    pub camera_y: f64,
    pub score: u32,
    pub has_first_city_bonus: bool,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// CAPTURE
// ============================================================================

/// Snapshot the whole game. Tiles are listed row by row.
pub fn capture(engine: &TurnEngine) -> SaveDocument {
    let world = engine.world();
    let board = world.board();

    let mut tiles: Vec<_> = board.tiles().collect();
    tiles.sort_by_key(|t| (t.hex.r(), t.hex.q()));

    let tiles = tiles
        .into_iter()
        .map(|tile| TileRecord {
            q: tile.hex.q(),
            r: tile.hex.r(),
            s: tile.hex.s(),
            terrain: tile.terrain.name().to_string(),
            unit: tile.unit.and_then(|id| world.unit(id)).map(|u| UnitRecord {
                kind: u.kind.blueprint().type_name.to_string(),
                position: u.position.into(),
                hp: u.hp,
                current_movement_range: u.movement,
                can_attack: u.can_attack,
                is_dug_in: u.is_dug_in,
                player_id: u.owner,
            }),
            building: tile
                .building
                .and_then(|id| world.city(id))
                .map(|c| BuildingRecord {
                    kind: c.kind.blueprint().type_name.to_string(),
                    position: c.position.into(),
                    hp: c.hp,
                    player_id: c.owner,
                    can_attack: c.can_attack,
                    completed_improvements: c.completed.iter().map(|k| k.id().to_string()).collect(),
                    improvement_in_progress: c.improvement.map(|o| OrderRecord {
                        id: o.kind.id().to_string(),
                        turns_remaining: o.turns_remaining,
                        committed: o.committed,
                    }),
                    recruitment_in_progress: c.recruitment.map(|o| OrderRecord {
                        id: o.kind.blueprint().id.to_string(),
                        turns_remaining: o.turns_remaining,
                        committed: o.committed,
                    }),
                }),
        })
        .collect();

    let players = engine
        .roster()
        .iter()
        .filter_map(|&id| world.player(id))
        .map(|p| PlayerRecord {
            player_id: p.id,
            resources: p.resources,
            income: p.income,
            expense: p.expense,
            camera_x: p.camera.0,
            camera_y: p.camera.1,
            score: p.score,
            has_first_city_bonus: p.has_first_city_bonus,
        })
        .collect();

    SaveDocument {
        board: BoardRecord {
            rows: board.rows(),
            cols: board.cols(),
            tiles,
        },
        players,
        current_player_id: engine.current_player_id(),
        current_round: engine.current_round(),
        game_over: engine.is_game_over(),
        game_over_message: engine.game_over_message().to_string(),
        player_scores: engine.player_scores().clone(),
    }
}

// ============================================================================
// RESTORE
// ============================================================================

/// Rebuild a game from a document. Balance knobs and the RNG come from
/// `config`; nothing in the document overrides them.
pub fn restore(doc: SaveDocument, config: GameConfig) -> Result<TurnEngine, PersistenceError> {
    // A drawn game legitimately ends with nobody left
    if doc.players.is_empty() && !doc.game_over {
        return Err(PersistenceError::NoPlayers);
    }

    // Pass 1: players
    let mut roster = Vec::with_capacity(doc.players.len());
    let mut players = Vec::with_capacity(doc.players.len());
    for rec in &doc.players {
        let mut player = Player::new(rec.player_id, rec.resources);
        player.income = rec.income;
        player.expense = rec.expense;
        player.camera = (rec.camera_x, rec.camera_y);
        player.score = rec.score;
        player.has_first_city_bonus = rec.has_first_city_bonus;
        roster.push(player.id);
        players.push(player);
    }

    // Pass 2: terrain only
    let mut layout = Vec::with_capacity(doc.board.tiles.len());
    for rec in &doc.board.tiles {
        let hex = Hex::new(rec.q, rec.r, rec.s)?;
        let terrain: Terrain = rec
            .terrain
            .parse()
            .map_err(PersistenceError::UnknownTerrain)?;
        layout.push((hex, terrain));
    }
    let board = Board::from_tiles(doc.board.rows, doc.board.cols, layout)?;

    let rng = rng_from_config(&config);
    let mut world = World::new(board, config, rng);
    for player in players {
        world.add_player(player);
    }

    // Pass 3: entities, bound to owners and tiles
    for rec in &doc.board.tiles {
        let tile = Hex::new(rec.q, rec.r, rec.s)?;
        if let Some(unit) = &rec.unit {
            restore_unit(&mut world, tile, unit)?;
        }
        if let Some(building) = &rec.building {
            restore_building(&mut world, tile, building)?;
        }
    }

    let current = match doc.current_player_id {
        Some(id) => roster
            .iter()
            .position(|&p| p == id)
            .ok_or(PersistenceError::UnknownPlayer(id))?,
        None => 0,
    };

    Ok(TurnEngine::from_parts(world, roster, current, doc.current_round).with_outcome(
        doc.game_over,
        doc.game_over_message,
        doc.player_scores,
    ))
}

/// Common checks for placing a loaded entity listed under `tile`
fn resolve_site(
    world: &World,
    tile: Hex,
    position: CubeRecord,
    owner: PlayerId,
) -> Result<Hex, PersistenceError> {
    let hex = Hex::try_from(position)?;
    if world.board().tile_at(hex).is_none() {
        return Err(PersistenceError::MissingTile(hex));
    }
    if hex != tile {
        return Err(PersistenceError::MisplacedEntity { tile, found: hex });
    }
    if world.player(owner).is_none() {
        return Err(PersistenceError::UnknownPlayer(owner));
    }
    Ok(hex)
}

fn check_hp(hex: Hex, hp: i32, max: i32) -> Result<(), PersistenceError> {
    if hp <= 0 || hp > max {
        return Err(PersistenceError::InvalidHitPoints { hex, hp, max });
    }
    Ok(())
}

fn restore_unit(world: &mut World, tile: Hex, rec: &UnitRecord) -> Result<(), PersistenceError> {
    let kind = UnitKind::from_type_name(&rec.kind)
        .ok_or_else(|| PersistenceError::UnknownUnitType(rec.kind.clone()))?;
    let hex = resolve_site(world, tile, rec.position, rec.player_id)?;
    check_hp(hex, rec.hp, kind.blueprint().health)?;
    let id = world
        .spawn_unit(kind, rec.player_id, hex)
        .map_err(|_| PersistenceError::DoubleOccupancy(hex))?;

    if let Some(unit) = world.unit_mut(id) {
        unit.hp = rec.hp;
        unit.movement = rec.current_movement_range.min(unit.max_movement);
        unit.can_attack = rec.can_attack;
        unit.is_dug_in = rec.is_dug_in;
    }
    Ok(())
}

fn restore_building(world: &mut World, tile: Hex, rec: &BuildingRecord) -> Result<(), PersistenceError> {
    let kind = BuildingKind::from_type_name(&rec.kind)
        .ok_or_else(|| PersistenceError::UnknownBuildingType(rec.kind.clone()))?;
    let hex = resolve_site(world, tile, rec.position, rec.player_id)?;
    check_hp(hex, rec.hp, kind.blueprint().health)?;

    let completed: BTreeSet<ImprovementKind> = rec
        .completed_improvements
        .iter()
        .map(|id| parse_improvement(id))
        .collect::<Result<_, _>>()?;
    let improvement = rec
        .improvement_in_progress
        .as_ref()
        .map(|o| {
            parse_improvement(&o.id).map(|kind| ProductionOrder {
                kind,
                turns_remaining: o.turns_remaining,
                committed: o.committed,
            })
        })
        .transpose()?;
    let recruitment = rec
        .recruitment_in_progress
        .as_ref()
        .map(|o| {
            UnitKind::from_id(&o.id)
                .ok_or_else(|| PersistenceError::UnknownUnitType(o.id.clone()))
                .map(|kind| ProductionOrder {
                    kind,
                    turns_remaining: o.turns_remaining,
                    committed: o.committed,
                })
        })
        .transpose()?;

    let id = world
        .place_city(rec.player_id, hex)
        .map_err(|_| PersistenceError::DoubleOccupancy(hex))?;
    if let Some(city) = world.city_mut(id) {
        city.hp = rec.hp;
        city.can_attack = rec.can_attack;
        city.completed = completed;
        city.improvement = improvement;
        city.recruitment = recruitment;
    }
    Ok(())
}

fn parse_improvement(id: &str) -> Result<ImprovementKind, PersistenceError> {
    ImprovementKind::from_id(id).ok_or_else(|| PersistenceError::UnknownImprovement(id.to_string()))
}

// ============================================================================
// FILES
// ============================================================================

pub fn to_json(engine: &TurnEngine) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(&capture(engine))?)
}

pub fn from_json(json: &str, config: GameConfig) -> Result<TurnEngine, PersistenceError> {
    let doc: SaveDocument = serde_json::from_str(json)?;
    restore(doc, config)
}

pub fn save_to_path(engine: &TurnEngine, path: &Path) -> Result<(), PersistenceError> {
    std::fs::write(path, to_json(engine)?)?;
    tracing::info!(path = %path.display(), round = engine.current_round(), "game saved");
    Ok(())
}

pub fn load_from_path(path: &Path, config: GameConfig) -> Result<TurnEngine, PersistenceError> {
    let json = std::fs::read_to_string(path)?;
    let engine = from_json(&json, config)?;
    tracing::info!(path = %path.display(), round = engine.current_round(), "game loaded");
    Ok(engine)
}
