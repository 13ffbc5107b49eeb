//! Player rosters, ledgers and scoring

use crate::ids::{BuildingId, EntityRef, PlayerId, UnitId};
use crate::resources::Resources;
use std::collections::BTreeSet;

pub const CITY_SCORE: u32 = 100;
pub const UNIT_SCORE: u32 = 5;
pub const IMPROVEMENT_SCORE: u32 = 50;
pub const FIRST_CITY_BONUS: u32 = 200;
/// One point per this many stockpiled resources
pub const RESOURCE_DIVISOR: u32 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub units: BTreeSet<UnitId>,
    pub buildings: BTreeSet<BuildingId>,
    pub resources: Resources,
    /// Last computed per-round income
    pub income: Resources,
    /// Last computed per-round upkeep
    pub expense: Resources,
    /// Opaque renderer memory, restored when the player's turn begins
    pub camera: (f64, f64),
    pub score: u32,
    pub has_first_city_bonus: bool,
}

impl Player {
    pub fn new(id: PlayerId, resources: Resources) -> Self {
        Self {
            id,
            units: BTreeSet::new(),
            buildings: BTreeSet::new(),
            resources,
            income: Resources::ZERO,
            expense: Resources::ZERO,
            camera: (0.0, 0.0),
            score: 0,
            has_first_city_bonus: false,
        }
    }

    /// Units followed by buildings
    pub fn military(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.units
            .iter()
            .copied()
            .map(EntityRef::from)
            .chain(self.buildings.iter().copied().map(EntityRef::from))
    }

    pub fn military_len(&self) -> usize {
        self.units.len() + self.buildings.len()
    }

    pub fn is_defeated(&self) -> bool {
        self.military_len() == 0
    }

    pub fn owns(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Unit(id) => self.units.contains(&id),
            EntityRef::Building(id) => self.buildings.contains(&id),
        }
    }

    pub fn forget(&mut self, entity: EntityRef) {
        match entity {
            EntityRef::Unit(id) => self.units.remove(&id),
            EntityRef::Building(id) => self.buildings.remove(&id),
        };
    }

    /// Recompute `score` from the roster. `improvements` is the total number
    /// of completed improvements across this player's cities. The first-city
    /// bonus is granted once and the flag is latched.
    pub fn calculate_score(&mut self, improvements: usize) -> u32 {
        let cities = self.buildings.len() as u32;
        let units = self.units.len() as u32;
        let mut score = [
            units.saturating_mul(UNIT_SCORE),
            self.resources.total() / RESOURCE_DIVISOR,
            (improvements as u32).saturating_mul(IMPROVEMENT_SCORE),
        ]
        .into_iter()
        .fold(cities.saturating_mul(CITY_SCORE), u32::saturating_add);

        if cities > 0 && !self.has_first_city_bonus {
            score = score.saturating_add(FIRST_CITY_BONUS);
            self.has_first_city_bonus = true;
        }

        self.score = score;
        score
    }
}
