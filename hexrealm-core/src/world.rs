//! The arena: board, entities and players, plus every action that touches
//! more than one of them.
//!
//! Tiles point at entities by id and entities remember their coordinate.
//! All mutation goes through this module so both sides stay in step.

use crate::blueprint::{ImprovementKind, UnitKind, CITY_BLUEPRINT};
use crate::board::{Board, Tile};
use crate::city::City;
use crate::config::GameConfig;
use crate::error::ActionError;
use crate::hex::{Hex, Layout, Point};
use crate::ids::{BuildingId, EntityRef, PlayerId, UnitId};
use crate::player::Player;
use crate::resources::Resources;
use crate::unit::Unit;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Result of a resolved attack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackReport {
    pub attacker: EntityRef,
    pub target: EntityRef,
    /// Hp actually removed from the target
    pub damage: i32,
    pub destroyed: bool,
}

/// Owns all mutable game state except turn bookkeeping
#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    units: BTreeMap<UnitId, Unit>,
    cities: BTreeMap<BuildingId, City>,
    players: BTreeMap<PlayerId, Player>,
    next_unit_id: u32,
    next_building_id: u32,
    rng: ChaCha8Rng,
    config: GameConfig,
}

/// Seeded from the config, or from entropy when no seed is set
pub fn rng_from_config(config: &GameConfig) -> ChaCha8Rng {
    match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

impl World {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty world on an existing board
    pub fn new(board: Board, config: GameConfig, rng: ChaCha8Rng) -> Self {
        Self {
            board,
            units: BTreeMap::new(),
            cities: BTreeMap::new(),
            players: BTreeMap::new(),
            next_unit_id: 1,
            next_building_id: 1,
            rng,
            config,
        }
    }

    /// Random board with every player given a city and a warrior on a
    /// random free tile
    pub fn generate(config: &GameConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut rng = rng_from_config(config);
        let board = Board::generate(config.rows, config.cols, &mut rng);
        let mut world = World::new(board, config.clone(), rng);

        let mut sites: Vec<Hex> = world.board.tiles().map(|t| t.hex).collect();
        sites.sort();
        sites.shuffle(&mut world.rng);

        let layout = Layout::pointy(Point::new(1.0, 1.0), Point::new(0.0, 0.0));
        for n in 1..=config.player_count {
            let id = PlayerId(n);
            world.add_player(Player::new(id, config.starting_resources));

            let site = loop {
                let hex = sites
                    .pop()
                    .ok_or_else(|| anyhow::anyhow!("no free tile left for {id}"))?;
                if world.board.tile_at(hex).is_some_and(Tile::is_vacant) {
                    break hex;
                }
            };
            world.place_city(id, site)?;
            world.spawn_unit(UnitKind::Warrior, id, site)?;

            let center = layout.hex_to_pixel(site);
            if let Some(player) = world.players.get_mut(&id) {
                player.camera = (center.x, center.y);
            }
            tracing::debug!(player = n, q = site.q(), r = site.r(), "player placed");
        }

        Ok(world)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn city(&self, id: BuildingId) -> Option<&City> {
        self.cities.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub(crate) fn city_mut(&mut self, id: BuildingId) -> Option<&mut City> {
        self.cities.get_mut(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values()
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> + '_ {
        self.cities.values()
    }

    pub fn unit_at(&self, hex: Hex) -> Option<&Unit> {
        self.board
            .tile_at(hex)
            .and_then(|t| t.unit)
            .and_then(|id| self.units.get(&id))
    }

    pub fn city_at(&self, hex: Hex) -> Option<&City> {
        self.board
            .tile_at(hex)
            .and_then(|t| t.building)
            .and_then(|id| self.cities.get(&id))
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.values()
    }

    pub fn owner_of(&self, entity: EntityRef) -> Option<PlayerId> {
        match entity {
            EntityRef::Unit(id) => self.units.get(&id).map(|u| u.owner),
            EntityRef::Building(id) => self.cities.get(&id).map(|c| c.owner),
        }
    }

    pub fn position_of(&self, entity: EntityRef) -> Option<Hex> {
        match entity {
            EntityRef::Unit(id) => self.units.get(&id).map(|u| u.position),
            EntityRef::Building(id) => self.cities.get(&id).map(|c| c.position),
        }
    }

    /// Whether `hex` holds a unit or building not owned by `player`
    pub fn has_enemy_at(&self, hex: Hex, player: PlayerId) -> bool {
        self.unit_at(hex).is_some_and(|u| u.owner != player)
            || self.city_at(hex).is_some_and(|c| c.owner != player)
    }

    /// Completed improvements across all of `player`'s cities
    pub fn improvement_count(&self, player: PlayerId) -> usize {
        self.cities
            .values()
            .filter(|c| c.owner == player)
            .map(|c| c.completed.len())
            .sum()
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    // ========================================================================
    // ROSTER MANAGEMENT
    // ========================================================================

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Put a new unit on `at` and register it with its owner
    pub fn spawn_unit(
        &mut self,
        kind: UnitKind,
        owner: PlayerId,
        at: Hex,
    ) -> Result<UnitId, ActionError> {
        let tile = self.board.tile_at_mut(at).ok_or(ActionError::OutsideGrid)?;
        if tile.has_unit() {
            return Err(ActionError::TileOccupied(at));
        }
        let player = self.players.get_mut(&owner).ok_or(ActionError::NotOwned)?;

        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        tile.unit = Some(id);
        player.units.insert(id);
        self.units.insert(id, Unit::new(id, kind, owner, at));
        Ok(id)
    }

    /// Put a new city on `at` without charging for it
    pub fn place_city(&mut self, owner: PlayerId, at: Hex) -> Result<BuildingId, ActionError> {
        let tile = self.board.tile_at_mut(at).ok_or(ActionError::OutsideGrid)?;
        if tile.building.is_some() {
            return Err(ActionError::TileOccupied(at));
        }
        let player = self.players.get_mut(&owner).ok_or(ActionError::NotOwned)?;

        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        tile.building = Some(id);
        player.buildings.insert(id);
        self.cities.insert(id, City::new(id, owner, at));
        Ok(id)
    }

    /// Remove an entity from the arena, its tile and its owner's roster
    pub fn destroy(&mut self, entity: EntityRef) {
        let (owner, position) = match entity {
            EntityRef::Unit(id) => match self.units.remove(&id) {
                Some(unit) => {
                    if let Some(tile) = self.board.tile_at_mut(unit.position) {
                        tile.unit = None;
                    }
                    (unit.owner, unit.position)
                }
                None => return,
            },
            EntityRef::Building(id) => match self.cities.remove(&id) {
                Some(city) => {
                    if let Some(tile) = self.board.tile_at_mut(city.position) {
                        tile.building = None;
                    }
                    (city.owner, city.position)
                }
                None => return,
            },
        };
        if let Some(player) = self.players.get_mut(&owner) {
            player.forget(entity);
        }
        tracing::info!(?entity, %owner, q = position.q(), r = position.r(), "destroyed");
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Walk a unit to `target` along the cheapest path
    pub fn move_unit(&mut self, id: UnitId, target: Hex) -> Result<u32, ActionError> {
        let unit = self.units.get(&id).ok_or(ActionError::StaleSelection)?;
        let from = unit.position;
        let target_tile = self.board.tile_at(target).ok_or(ActionError::OutsideGrid)?;
        if target == from {
            return Err(ActionError::AlreadyThere);
        }
        if target_tile.has_unit() {
            return Err(ActionError::TileOccupied(target));
        }
        let path = self
            .board
            .find_path(from, target)
            .ok_or(ActionError::Unreachable)?;
        if path.cost > unit.movement {
            return Err(ActionError::InsufficientMovement {
                remaining: unit.movement,
                required: path.cost,
            });
        }

        if let Some(tile) = self.board.tile_at_mut(from) {
            tile.unit = None;
        }
        if let Some(tile) = self.board.tile_at_mut(target) {
            tile.unit = Some(id);
        }
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = target;
            unit.movement -= path.cost;
            unit.is_dug_in = false;
        }
        tracing::info!(
            unit = id.0,
            from = ?(from.q(), from.r()),
            to = ?(target.q(), target.r()),
            cost = path.cost,
            "unit moved"
        );
        Ok(path.cost)
    }

    /// Resolve one attack. Checks, in order: the attacker may still attack,
    /// the target is in range, the target belongs to someone else.
    pub fn attack(
        &mut self,
        attacker: EntityRef,
        target: EntityRef,
    ) -> Result<AttackReport, ActionError> {
        let (can_attack, range, from, owner) = match attacker {
            EntityRef::Unit(id) => {
                let u = self.units.get(&id).ok_or(ActionError::StaleSelection)?;
                (u.can_attack, u.attack_range, u.position, u.owner)
            }
            EntityRef::Building(id) => {
                let c = self.cities.get(&id).ok_or(ActionError::StaleSelection)?;
                (c.can_attack, c.attack_range, c.position, c.owner)
            }
        };
        let to = self.position_of(target).ok_or(ActionError::NotAnEnemy)?;
        let target_owner = self.owner_of(target).ok_or(ActionError::NotAnEnemy)?;

        if !can_attack {
            return Err(ActionError::AlreadyAttacked);
        }
        let distance = from.distance_to(to);
        if distance > range {
            return Err(ActionError::OutOfRange { distance, range });
        }
        if target_owner == owner {
            return Err(ActionError::NotAnEnemy);
        }

        let rolled = match attacker {
            EntityRef::Unit(id) => {
                let unit = self.units.get_mut(&id).ok_or(ActionError::StaleSelection)?;
                let rolled = unit.roll_damage(&mut self.rng);
                unit.mark_attacked();
                rolled
            }
            EntityRef::Building(id) => {
                let city = self.cities.get_mut(&id).ok_or(ActionError::StaleSelection)?;
                let rolled = city.roll_damage(&mut self.rng);
                city.can_attack = false;
                rolled
            }
        };

        let (damage, destroyed) = match target {
            EntityRef::Unit(id) => {
                let unit = self.units.get_mut(&id).ok_or(ActionError::NotAnEnemy)?;
                let before = unit.hp;
                let destroyed = unit.take_damage(rolled);
                (before - unit.hp, destroyed)
            }
            EntityRef::Building(id) => {
                let city = self.cities.get_mut(&id).ok_or(ActionError::NotAnEnemy)?;
                let before = city.hp;
                let destroyed = city.take_damage(rolled);
                (before - city.hp, destroyed)
            }
        };

        tracing::info!(?attacker, ?target, damage, destroyed, "attack resolved");
        if destroyed {
            self.destroy(target);
        }

        Ok(AttackReport {
            attacker,
            target,
            damage,
            destroyed,
        })
    }

    pub fn dig_in(&mut self, id: UnitId) -> Result<(), ActionError> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::StaleSelection)?;
        unit.dig_in()?;
        tracing::debug!(unit = id.0, "dug in");
        Ok(())
    }

    /// Check a founding site: on the board, nothing on it, and no city within
    /// the configured radius
    pub fn check_founding_site(&self, at: Hex) -> Result<(), ActionError> {
        let tile = self.board.tile_at(at).ok_or(ActionError::OutsideGrid)?;
        if !tile.is_vacant() {
            return Err(ActionError::FoundingSiteOccupied);
        }
        let radius = self.config.founding_radius;
        let crowded = self
            .board
            .hexes_in_radius(at, radius)
            .into_iter()
            .any(|hex| self.city_at(hex).is_some());
        if crowded {
            return Err(ActionError::CityTooClose { radius });
        }
        Ok(())
    }

    /// Found a city for `owner` at `at`, charging the founding cost
    pub fn found_city(&mut self, owner: PlayerId, at: Hex) -> Result<BuildingId, ActionError> {
        self.check_founding_site(at)?;
        let player = self.players.get_mut(&owner).ok_or(ActionError::NotOwned)?;
        if !player.resources.try_spend(&CITY_BLUEPRINT.founding_cost) {
            return Err(ActionError::InsufficientResources);
        }
        let id = self.place_city(owner, at)?;
        tracing::info!(city = id.0, %owner, q = at.q(), r = at.r(), "city founded");
        Ok(id)
    }

    pub fn start_improvement(
        &mut self,
        city: BuildingId,
        kind: ImprovementKind,
    ) -> Result<(), ActionError> {
        let city = self.cities.get_mut(&city).ok_or(ActionError::StaleSelection)?;
        let player = self
            .players
            .get_mut(&city.owner)
            .ok_or(ActionError::NotOwned)?;
        city.start_improvement(kind, &mut player.resources)
    }

    pub fn start_recruitment(&mut self, city: BuildingId, kind: UnitKind) -> Result<(), ActionError> {
        let city = self.cities.get_mut(&city).ok_or(ActionError::StaleSelection)?;
        let player = self
            .players
            .get_mut(&city.owner)
            .ok_or(ActionError::NotOwned)?;
        city.start_recruitment(kind, &mut player.resources)
    }

    // ========================================================================
    // ROUND END
    // ========================================================================

    /// Refresh every entity, advance production and pay out the economy
    pub fn end_round(&mut self) {
        let dug_in_regen = self.config.dug_in_regen;
        let city_regen = self.config.city_regen;

        for unit in self.units.values_mut() {
            unit.on_round_end(dug_in_regen);
        }

        let city_ids: Vec<BuildingId> = self.cities.keys().copied().collect();
        for id in city_ids {
            let Some(city) = self.cities.get_mut(&id) else {
                continue;
            };
            let report = city.on_round_end(city_regen);
            let (owner, position) = (city.owner, city.position);

            if let Some(kind) = report.completed_improvement {
                tracing::info!(city = id.0, improvement = kind.id(), "improvement completed");
            }
            if let Some(kind) = report.ready_recruit {
                self.deliver_recruit(id, kind, owner, position);
            }
        }

        let player_ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in player_ids {
            self.apply_economy(id);
        }
    }

    /// Place a finished recruit on the city tile or its first free neighbor.
    /// The order stays queued when there is no room.
    fn deliver_recruit(&mut self, city: BuildingId, kind: UnitKind, owner: PlayerId, at: Hex) {
        let site = std::iter::once(at).chain(at.neighbors()).find(|&hex| {
            self.board.tile_at(hex).is_some_and(|t| !t.has_unit())
                && self.city_at(hex).map_or(true, |c| c.owner == owner)
        });
        let Some(site) = site else {
            tracing::debug!(city = city.0, "no room for recruit, waiting");
            return;
        };
        match self.spawn_unit(kind, owner, site) {
            Ok(unit) => {
                if let Some(city) = self.cities.get_mut(&city) {
                    city.finish_recruitment();
                }
                tracing::info!(unit = unit.0, kind = kind.blueprint().id, %owner, "unit recruited");
            }
            Err(e) => tracing::warn!(city = city.0, error = %e, "recruit could not be placed"),
        }
    }

    /// Recompute a player's income and expense from its cities and units
    pub fn refresh_economy(&mut self, id: PlayerId) {
        let income = self
            .cities
            .values()
            .filter(|c| c.owner == id)
            .fold(Resources::ZERO, |acc, c| acc + c.yields());
        let upkeep = self.config.unit_upkeep;
        if let Some(player) = self.players.get_mut(&id) {
            player.income = income;
            player.expense = Resources::food((player.units.len() as u32).saturating_mul(upkeep));
        }
    }

    /// Food storage across a player's cities
    pub fn food_storage(&self, id: PlayerId) -> u32 {
        self.cities
            .values()
            .filter(|c| c.owner == id)
            .map(City::food_storage)
            .sum()
    }

    /// Apply one round of income minus expense. Food is capped by storage;
    /// nothing drops below zero.
    pub fn apply_economy(&mut self, id: PlayerId) {
        self.refresh_economy(id);
        let storage = self.food_storage(id);
        if let Some(player) = self.players.get_mut(&id) {
            let mut next = (player.resources + player.income).saturating_sub(&player.expense);
            next.food = next.food.min(storage);
            player.resources = next;
            tracing::debug!(player = %id, resources = ?player.resources, "economy applied");
        }
    }

    /// Recompute and store every remaining player's score
    pub fn final_scores(&mut self) -> BTreeMap<PlayerId, u32> {
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        let mut scores = BTreeMap::new();
        for id in ids {
            let improvements = self.improvement_count(id);
            if let Some(player) = self.players.get_mut(&id) {
                scores.insert(id, player.calculate_score(improvements));
            }
        }
        scores
    }
}
