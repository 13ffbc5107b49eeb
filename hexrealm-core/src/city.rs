//! Cities: stationary combatants with production queues

use crate::blueprint::{BuildingKind, ImprovementKind, UnitKind, CITY_BLUEPRINT};
use crate::error::ActionError;
use crate::hex::Hex;
use crate::ids::{BuildingId, PlayerId};
use crate::resources::Resources;
use crate::unit::roll_damage;
use rand::Rng;
use std::collections::BTreeSet;

/// An in-progress improvement or recruitment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductionOrder<K> {
    pub kind: K,
    pub turns_remaining: u32,
    /// What was charged when the order was placed; refunded on replacement
    pub committed: Resources,
}

/// What a city's round end produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProductionReport {
    pub completed_improvement: Option<ImprovementKind>,
    /// Recruit whose timer has elapsed and is waiting to be placed
    pub ready_recruit: Option<UnitKind>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct City {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub owner: PlayerId,
    pub position: Hex,
    pub hp: i32,
    pub max_hp: i32,
    pub damage: i32,
    pub damage_spread: i32,
    pub defense: i32,
    pub attack_range: u32,
    pub can_attack: bool,
    pub completed: BTreeSet<ImprovementKind>,
    pub improvement: Option<ProductionOrder<ImprovementKind>>,
    pub recruitment: Option<ProductionOrder<UnitKind>>,
}

impl City {
    pub fn new(id: BuildingId, owner: PlayerId, position: Hex) -> Self {
        let bp = &CITY_BLUEPRINT;
        Self {
            id,
            kind: bp.kind,
            owner,
            position,
            hp: bp.health,
            max_hp: bp.health,
            damage: bp.damage,
            damage_spread: bp.damage_spread,
            defense: bp.defense,
            attack_range: bp.attack_range,
            can_attack: true,
            completed: BTreeSet::new(),
            improvement: None,
            recruitment: None,
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

    /// Apply raw damage reduced by defense. Returns true when destroyed.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp -= (amount - self.defense).max(0);
        !self.is_alive()
    }

    pub fn has_improvement(&self, kind: ImprovementKind) -> bool {
        self.completed.contains(&kind)
    }

    /// Per-round production including completed improvements
    pub fn yields(&self) -> Resources {
        self.completed
            .iter()
            .fold(self.kind.blueprint().base_yield, |acc, kind| {
                acc + kind.blueprint().yields
            })
    }

    pub fn food_storage(&self) -> u32 {
        self.kind.blueprint().food_storage
            + self
                .completed
                .iter()
                .map(|kind| kind.blueprint().extra_storage)
                .sum::<u32>()
    }

    // ========================================================================
    // PRODUCTION
    // ========================================================================

    /// Replace the improvement order. The previous order is refunded first; on
    /// failure no improvement is left in progress.
    pub fn start_improvement(
        &mut self,
        kind: ImprovementKind,
        wallet: &mut Resources,
    ) -> Result<(), ActionError> {
        if self.has_improvement(kind) {
            return Err(ActionError::AlreadyBuilt(kind));
        }
        if let Some(previous) = self.improvement.take() {
            *wallet += previous.committed;
        }
        let bp = kind.blueprint();
        if !wallet.try_spend(&bp.cost) {
            return Err(ActionError::InsufficientResources);
        }
        self.improvement = Some(ProductionOrder {
            kind,
            turns_remaining: bp.build_time,
            committed: bp.cost,
        });
        tracing::debug!(city = self.id.0, improvement = bp.id, "improvement started");
        Ok(())
    }

    /// Replace the recruitment order, same refund rule as improvements
    pub fn start_recruitment(
        &mut self,
        kind: UnitKind,
        wallet: &mut Resources,
    ) -> Result<(), ActionError> {
        let bp = kind.blueprint();
        if let Some(requires) = bp.requires {
            if !self.has_improvement(requires) {
                return Err(ActionError::RecruitmentLocked {
                    unit: kind,
                    requires,
                });
            }
        }
        if let Some(previous) = self.recruitment.take() {
            *wallet += previous.committed;
        }
        if !wallet.try_spend(&bp.cost) {
            return Err(ActionError::InsufficientResources);
        }
        self.recruitment = Some(ProductionOrder {
            kind,
            turns_remaining: bp.recruit_time,
            committed: bp.cost,
        });
        tracing::debug!(city = self.id.0, unit = bp.id, "recruitment started");
        Ok(())
    }

    /// Drop a recruitment order whose unit has been placed
    pub fn finish_recruitment(&mut self) -> Option<UnitKind> {
        self.recruitment.take().map(|order| order.kind)
    }

    /// Refresh attack, regenerate and advance both production timers
    pub fn on_round_end(&mut self, regen: i32) -> ProductionReport {
        self.can_attack = true;
        self.hp = (self.hp + regen).min(self.max_hp);

        let mut report = ProductionReport::default();

        if let Some(order) = self.improvement.as_mut() {
            order.turns_remaining = order.turns_remaining.saturating_sub(1);
            if order.turns_remaining == 0 {
                let kind = order.kind;
                self.improvement = None;
                self.completed.insert(kind);
                report.completed_improvement = Some(kind);
            }
        }

        if let Some(order) = self.recruitment.as_mut() {
            order.turns_remaining = order.turns_remaining.saturating_sub(1);
            if order.turns_remaining == 0 {
                report.ready_recruit = Some(order.kind);
            }
        }

        report
    }
}
