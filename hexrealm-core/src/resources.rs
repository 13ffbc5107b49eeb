//! Resource ledger shared by players, costs and yields

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Amounts of each resource. Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources {
    pub gold: u32,
    pub wood: u32,
    pub stone: u32,
    pub metal: u32,
    pub food: u32,
}

impl Resources {
    pub const ZERO: Resources = Resources::new(0, 0, 0, 0, 0);

    pub const fn new(gold: u32, wood: u32, stone: u32, metal: u32, food: u32) -> Self {
        Self {
            gold,
            wood,
            stone,
            metal,
            food,
        }
    }

    pub const fn gold(gold: u32) -> Self {
        Self::new(gold, 0, 0, 0, 0)
    }

    pub const fn food(food: u32) -> Self {
        Self::new(0, 0, 0, 0, food)
    }

    /// Whether every amount in `cost` is available
    pub fn covers(&self, cost: &Resources) -> bool {
        self.gold >= cost.gold
            && self.wood >= cost.wood
            && self.stone >= cost.stone
            && self.metal >= cost.metal
            && self.food >= cost.food
    }

    /// Deduct `cost` if affordable; leaves `self` untouched otherwise
    pub fn try_spend(&mut self, cost: &Resources) -> bool {
        if !self.covers(cost) {
            return false;
        }
        *self = self.saturating_sub(cost);
        true
    }

    pub fn saturating_sub(&self, other: &Resources) -> Resources {
        Resources {
            gold: self.gold.saturating_sub(other.gold),
            wood: self.wood.saturating_sub(other.wood),
            stone: self.stone.saturating_sub(other.stone),
            metal: self.metal.saturating_sub(other.metal),
            food: self.food.saturating_sub(other.food),
        }
    }

    pub fn total(&self) -> u32 {
        [self.wood, self.stone, self.metal, self.food]
            .into_iter()
            .fold(self.gold, u32::saturating_add)
    }

    pub fn is_zero(&self) -> bool {
        *self == Resources::ZERO
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, other: Resources) -> Resources {
        Resources {
            gold: self.gold.saturating_add(other.gold),
            wood: self.wood.saturating_add(other.wood),
            stone: self.stone.saturating_add(other.stone),
            metal: self.metal.saturating_add(other.metal),
            food: self.food.saturating_add(other.food),
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, other: Resources) {
        *self = *self + other;
    }
}
