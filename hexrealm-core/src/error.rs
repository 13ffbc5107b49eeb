//! Error taxonomy
//!
//! - [`HexError`]: structural invariant violations, rejected at construction.
//! - [`ActionError`]: invalid player commands. Always recoverable; the game
//!   state is left untouched and the message is meant for the HUD.
//! - [`PersistenceError`]: a save document that cannot be turned back into a
//!   game. Fatal to the load only.

use crate::blueprint::{ImprovementKind, UnitKind};
use crate::hex::Hex;
use crate::ids::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("cube coordinate ({q}, {r}, {s}) does not satisfy q + r + s = 0")]
    InvalidCube { q: i32, r: i32, s: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("target is outside the grid")]
    OutsideGrid,

    #[error("the game is over")]
    GameOver,

    #[error("nothing is selected")]
    NothingSelected,

    #[error("the selected entity no longer exists")]
    StaleSelection,

    #[error("that entity belongs to another player")]
    NotOwned,

    #[error("unit is already on this tile")]
    AlreadyThere,

    #[error("tile {0:?} is occupied")]
    TileOccupied(Hex),

    #[error("target tile is unreachable")]
    Unreachable,

    #[error("not enough movement: {remaining} left, {required} needed")]
    InsufficientMovement { remaining: u32, required: u32 },

    #[error("already attacked this round")]
    AlreadyAttacked,

    #[error("target out of attack range ({distance} > {range})")]
    OutOfRange { distance: u32, range: u32 },

    #[error("target is not an enemy")]
    NotAnEnemy,

    #[error("unit is already dug in")]
    AlreadyDugIn,

    #[error("unit cannot dig in after acting")]
    CannotDigIn,

    #[error("not enough resources")]
    InsufficientResources,

    #[error("{0:?} is already built in this city")]
    AlreadyBuilt(ImprovementKind),

    #[error("recruiting {unit:?} requires {requires:?}")]
    RecruitmentLocked {
        unit: UnitKind,
        requires: ImprovementKind,
    },

    #[error("a city cannot be founded on an occupied tile")]
    FoundingSiteOccupied,

    #[error("another city is within {radius} tiles")]
    CityTooClose { radius: u32 },

    #[error("no selected city to act from")]
    NoCitySelected,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("unknown building type: {0}")]
    UnknownBuildingType(String),

    #[error("unknown terrain: {0}")]
    UnknownTerrain(String),

    #[error("unknown improvement: {0}")]
    UnknownImprovement(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] HexError),

    #[error("tile {0:?} is listed twice")]
    DuplicateTile(Hex),

    #[error("board of {rows}x{cols} exceeds the size limit")]
    BoardTooLarge { rows: u32, cols: u32 },

    #[error("tile {0:?} is not on the board")]
    MissingTile(Hex),

    #[error("tile {0:?} holds two entities of the same category")]
    DoubleOccupancy(Hex),

    #[error("entity at {found:?} is listed under tile {tile:?}")]
    MisplacedEntity { tile: Hex, found: Hex },

    #[error("entity at {hex:?} has {hp} hp, expected 1..={max}")]
    InvalidHitPoints { hex: Hex, hp: i32, max: i32 },

    #[error("save references unknown {0}")]
    UnknownPlayer(PlayerId),

    #[error("saved game has no players")]
    NoPlayers,
}
