//! Mobile combatants

use crate::blueprint::UnitKind;
use crate::error::ActionError;
use crate::hex::Hex;
use crate::ids::{PlayerId, UnitId};
use rand::Rng;

/// Roll `damage + U[-spread, spread]`, floored at zero
pub fn roll_damage<R: Rng + ?Sized>(damage: i32, spread: i32, rng: &mut R) -> i32 {
    let spread = spread.abs();
    (damage + rng.gen_range(-spread..=spread)).max(0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub owner: PlayerId,
    pub position: Hex,
    pub hp: i32,
    pub max_hp: i32,
    pub damage: i32,
    pub damage_spread: i32,
    pub attack_range: u32,
    pub max_movement: u32,
    pub movement: u32,
    pub can_attack: bool,
    pub is_dug_in: bool,
}

impl Unit {
    /// Fresh unit at full health and full movement
    pub fn new(id: UnitId, kind: UnitKind, owner: PlayerId, position: Hex) -> Self {
        let bp = kind.blueprint();
        Self {
            id,
            kind,
            owner,
            position,
            hp: bp.health,
            max_hp: bp.health,
            damage: bp.damage,
            damage_spread: bp.damage_spread,
            attack_range: bp.attack_range,
            max_movement: bp.movement_range,
            movement: bp.movement_range,
            can_attack: true,
            is_dug_in: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.blueprint().name
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn roll_damage<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        roll_damage(self.damage, self.damage_spread, rng)
    }

    /// Apply raw damage. Returns true when the unit is destroyed.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp -= amount.max(0);
        !self.is_alive()
    }

    /// Spend the unit's turn after an attack
    pub fn mark_attacked(&mut self) {
        self.can_attack = false;
        self.movement = 0;
        self.is_dug_in = false;
    }

    pub fn dig_in(&mut self) -> Result<(), ActionError> {
        if self.is_dug_in {
            return Err(ActionError::AlreadyDugIn);
        }
        if !self.can_attack {
            return Err(ActionError::CannotDigIn);
        }
        self.is_dug_in = true;
        self.can_attack = false;
        self.movement = 0;
        Ok(())
    }

    /// Refresh movement and attack; dug-in units heal `regen`
    pub fn on_round_end(&mut self, regen: i32) {
        self.movement = self.max_movement;
        self.can_attack = true;
        if self.is_dug_in {
            self.hp = (self.hp + regen).min(self.max_hp);
        }
    }
}
