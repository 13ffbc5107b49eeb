//! HEXREALM Core - turn-based hex strategy engine
//!
//! This crate provides the game logic for HEXREALM:
//! - Hex geometry (cube coordinates, rounding, pixel layout)
//! - Board storage, A* pathfinding and reachability
//! - Units and cities with combat and production
//! - Player ledgers and scoring
//! - Turn engine with the selection state machine
//! - JSON save and load

pub mod hex;
pub mod terrain;
pub mod ids;
pub mod resources;
pub mod board;
pub mod blueprint;
pub mod unit;
pub mod city;
pub mod player;
pub mod world;
pub mod engine;
pub mod save;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use hex::{Hex, FractionalHex, Layout, Point, distance, DIRECTIONS};
pub use terrain::Terrain;
pub use ids::{PlayerId, UnitId, BuildingId, EntityRef};
pub use resources::Resources;
pub use board::{Board, Tile, Path, Highlights, MAX_EXTENT};
pub use blueprint::{UnitKind, BuildingKind, ImprovementKind};
pub use unit::Unit;
pub use city::{City, ProductionOrder};
pub use player::Player;
pub use world::{World, AttackReport};
pub use engine::{TurnEngine, Selection, TargetOutcome};
pub use config::GameConfig;
pub use error::{HexError, ActionError, PersistenceError};
