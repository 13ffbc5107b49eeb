//! Handles into the world arena
//!
//! Entities never hold references to each other or to tiles; they hold these
//! ids and the board coordinate, and the arena resolves them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Player number as shown to players and written to saves (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub u32);

/// Either kind of combatant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Unit(UnitId),
    Building(BuildingId),
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

impl From<UnitId> for EntityRef {
    fn from(id: UnitId) -> Self {
        EntityRef::Unit(id)
    }
}

impl From<BuildingId> for EntityRef {
    fn from(id: BuildingId) -> Self {
        EntityRef::Building(id)
    }
}
