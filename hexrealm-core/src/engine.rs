//! Turn engine: selection state machine, turn order and round lifecycle
//!
//! Every input is a method taking `&mut self`. Rejected commands come back as
//! [`ActionError`] and leave the game as it was, apart from the selection
//! transitions documented on [`TurnEngine::target_tile`].

use crate::blueprint::{ImprovementKind, UnitKind};
use crate::board::{Board, Highlights};
use crate::config::GameConfig;
use crate::error::{ActionError, PersistenceError};
use crate::hex::Hex;
use crate::ids::{BuildingId, EntityRef, PlayerId, UnitId};
use crate::player::Player;
use crate::save;
use crate::world::{AttackReport, World};
use std::collections::BTreeMap;
use std::path::Path;

/// What the next `target_tile` means
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    SelectingEntity,
    UnitSelected(UnitId),
    BuildingSelected(BuildingId),
    /// Waiting for a site; `origin` is the city the order was given from
    FoundingNewCity { origin: BuildingId },
}

/// What a successful `target_tile` did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Enemy or empty tile looked at; nothing selected
    Inspected(Hex),
    Selected(EntityRef),
    Deselected,
    Moved { unit: UnitId, to: Hex, cost: u32 },
    Attacked(AttackReport),
    CityFounded(BuildingId),
}

#[derive(Clone, Debug)]
pub struct TurnEngine {
    world: World,
    /// Active players in turn order
    roster: Vec<PlayerId>,
    current: usize,
    round: u32,
    selection: Selection,
    game_over: bool,
    game_over_message: String,
    player_scores: BTreeMap<PlayerId, u32>,
}

impl TurnEngine {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Generate a fresh game from `config`
    pub fn new_game(config: &GameConfig) -> anyhow::Result<Self> {
        let world = World::generate(config)?;
        let roster = world.players().map(|p| p.id).collect();
        let mut engine = Self::from_parts(world, roster, 0, 1);
        engine.refresh_current_economy();
        tracing::info!(
            players = config.player_count,
            rows = config.rows,
            cols = config.cols,
            "new game"
        );
        Ok(engine)
    }

    /// Assemble an engine around an existing world, in the selecting state
    pub fn from_parts(world: World, roster: Vec<PlayerId>, current: usize, round: u32) -> Self {
        Self {
            world,
            roster,
            current,
            round,
            selection: Selection::SelectingEntity,
            game_over: false,
            game_over_message: String::new(),
            player_scores: BTreeMap::new(),
        }
    }

    pub(crate) fn with_outcome(
        mut self,
        game_over: bool,
        message: String,
        scores: BTreeMap<PlayerId, u32>,
    ) -> Self {
        self.game_over = game_over;
        self.game_over_message = message;
        self.player_scores = scores;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn board(&self) -> &Board {
        self.world.board()
    }

    pub fn highlights(&self) -> &Highlights {
        self.world.board().highlights()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_id().and_then(|id| self.world.player(id))
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.roster.get(self.current).copied()
    }

    pub fn current_round(&self) -> u32 {
        self.round
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn game_over_message(&self) -> &str {
        &self.game_over_message
    }

    pub fn player_scores(&self) -> &BTreeMap<PlayerId, u32> {
        &self.player_scores
    }

    /// Remember where the renderer's camera was for the current player
    pub fn remember_camera(&mut self, x: f64, y: f64) {
        if let Some(id) = self.current_player_id() {
            if let Some(player) = self.world.player_mut(id) {
                player.camera = (x, y);
            }
        }
    }

    // ========================================================================
    // TARGETING
    // ========================================================================

    /// Handle a click on `target` (`None` when the click missed the grid).
    ///
    /// - Selecting: own unit or city is selected, anything else is inspected.
    /// - Unit selected: own tile deselects, enemies are attacked, another own
    ///   unit takes the selection, other tiles are move targets. A failed move
    ///   keeps the selection and previews the path when one exists.
    /// - City selected: own tile deselects, enemies are attacked, anything
    ///   else deselects.
    /// - Founding: the tile is tried as a city site; the engine returns to
    ///   selecting whether or not it succeeds.
    pub fn target_tile(&mut self, target: Option<Hex>) -> Result<TargetOutcome, ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        let hex = target
            .filter(|&h| self.world.board().contains(h))
            .ok_or(ActionError::OutsideGrid)?;

        match self.selection {
            Selection::SelectingEntity => Ok(self.select_at(hex)),
            Selection::UnitSelected(id) => self.target_with_unit(id, hex),
            Selection::BuildingSelected(id) => self.target_with_city(id, hex),
            Selection::FoundingNewCity { .. } => self.target_founding_site(hex),
        }
    }

    fn select_at(&mut self, hex: Hex) -> TargetOutcome {
        let Some(me) = self.current_player_id() else {
            return TargetOutcome::Inspected(hex);
        };
        if let Some(unit) = self.world.unit_at(hex).filter(|u| u.owner == me) {
            let id = unit.id;
            self.select_unit(id);
            return TargetOutcome::Selected(id.into());
        }
        if let Some(city) = self.world.city_at(hex).filter(|c| c.owner == me) {
            let id = city.id;
            self.select_city(id);
            return TargetOutcome::Selected(id.into());
        }
        self.reset_selection();
        self.world.board_mut().highlights_mut().selected = Some(hex);
        TargetOutcome::Inspected(hex)
    }

    fn target_with_unit(&mut self, id: UnitId, hex: Hex) -> Result<TargetOutcome, ActionError> {
        let me = self.current_player_id().ok_or(ActionError::GameOver)?;
        let Some(position) = self.world.unit(id).map(|u| u.position) else {
            self.reset_selection();
            return Err(ActionError::StaleSelection);
        };

        if hex == position {
            self.reset_selection();
            return Ok(TargetOutcome::Deselected);
        }

        if let Some(other) = self.world.unit_at(hex) {
            let (other_id, other_owner) = (other.id, other.owner);
            if other_owner == me {
                self.select_unit(other_id);
                return Ok(TargetOutcome::Selected(other_id.into()));
            }
            let report = self.world.attack(id.into(), other_id.into())?;
            self.reset_selection();
            return Ok(TargetOutcome::Attacked(report));
        }

        let enemy_city = self.world.city_at(hex).filter(|c| c.owner != me).map(|c| c.id);
        if let Some(city) = enemy_city {
            let report = self.world.attack(id.into(), city.into())?;
            self.reset_selection();
            return Ok(TargetOutcome::Attacked(report));
        }

        match self.world.move_unit(id, hex) {
            Ok(cost) => {
                self.reset_selection();
                Ok(TargetOutcome::Moved { unit: id, to: hex, cost })
            }
            Err(e) => {
                let preview = self
                    .world
                    .board()
                    .find_path(position, hex)
                    .map(|p| p.tiles)
                    .unwrap_or_default();
                self.world.board_mut().highlights_mut().path_preview = preview;
                Err(e)
            }
        }
    }

    fn target_with_city(&mut self, id: BuildingId, hex: Hex) -> Result<TargetOutcome, ActionError> {
        let me = self.current_player_id().ok_or(ActionError::GameOver)?;
        let Some(position) = self.world.city(id).map(|c| c.position) else {
            self.reset_selection();
            return Err(ActionError::StaleSelection);
        };

        if hex != position {
            let enemy = match self.world.unit_at(hex) {
                Some(u) if u.owner != me => Some(EntityRef::from(u.id)),
                _ => self
                    .world
                    .city_at(hex)
                    .filter(|c| c.owner != me)
                    .map(|c| EntityRef::from(c.id)),
            };
            if let Some(target) = enemy {
                let report = self.world.attack(id.into(), target)?;
                self.reset_selection();
                return Ok(TargetOutcome::Attacked(report));
            }
        }

        self.reset_selection();
        Ok(TargetOutcome::Deselected)
    }

    fn target_founding_site(&mut self, hex: Hex) -> Result<TargetOutcome, ActionError> {
        let me = self.current_player_id().ok_or(ActionError::GameOver)?;
        self.reset_selection();
        let id = self.world.found_city(me, hex)?;
        Ok(TargetOutcome::CityFounded(id))
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    fn select_unit(&mut self, id: UnitId) {
        let Some(unit) = self.world.unit(id) else {
            return;
        };
        let (owner, position, movement, range) =
            (unit.owner, unit.position, unit.movement, unit.attack_range);

        let board = self.world.board();
        // Enemy cities are attack targets, never move targets
        let reachable = board
            .reachable_tiles(position, movement, false, 0)
            .into_iter()
            .filter(|&h| !self.world.city_at(h).is_some_and(|c| c.owner != owner))
            .collect();
        let reachable_enemies = board
            .reachable_tiles(position, movement, true, 1)
            .into_iter()
            .filter(|&h| self.world.has_enemy_at(h, owner))
            .collect();
        let attackable_enemies = board
            .hexes_in_radius(position, range)
            .into_iter()
            .filter(|&h| self.world.has_enemy_at(h, owner))
            .collect();

        *self.world.board_mut().highlights_mut() = Highlights {
            selected: Some(position),
            reachable,
            attackable_enemies,
            reachable_enemies,
            path_preview: Vec::new(),
        };
        self.selection = Selection::UnitSelected(id);
        tracing::debug!(unit = id.0, "unit selected");
    }

    fn select_city(&mut self, id: BuildingId) {
        let Some(city) = self.world.city(id) else {
            return;
        };
        let (owner, position, range) = (city.owner, city.position, city.attack_range);

        let in_range = self.world.board().hexes_in_radius(position, range);
        let attackable_enemies = in_range
            .iter()
            .copied()
            .filter(|&h| self.world.has_enemy_at(h, owner))
            .collect();

        *self.world.board_mut().highlights_mut() = Highlights {
            selected: Some(position),
            reachable: in_range.into_iter().collect(),
            attackable_enemies,
            reachable_enemies: Default::default(),
            path_preview: Vec::new(),
        };
        self.selection = Selection::BuildingSelected(id);
        tracing::debug!(city = id.0, "city selected");
    }

    fn reset_selection(&mut self) {
        self.selection = Selection::SelectingEntity;
        self.world.board_mut().clear_highlights();
    }

    pub fn deselect(&mut self) {
        self.reset_selection();
    }

    /// The selected city, if it still exists and belongs to the current player
    fn selected_city(&self) -> Result<BuildingId, ActionError> {
        let Selection::BuildingSelected(id) = self.selection else {
            return Err(ActionError::NoCitySelected);
        };
        let city = self.world.city(id).ok_or(ActionError::StaleSelection)?;
        if Some(city.owner) != self.current_player_id() {
            return Err(ActionError::NotOwned);
        }
        Ok(id)
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    pub fn dig_in_selected_unit(&mut self) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        let Selection::UnitSelected(id) = self.selection else {
            return Err(ActionError::NothingSelected);
        };
        self.world.dig_in(id)?;
        self.reset_selection();
        Ok(())
    }

    /// Switch to choosing a site for a new city
    pub fn begin_city_founding(&mut self) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        let origin = self.selected_city()?;
        self.world.board_mut().clear_highlights();
        self.selection = Selection::FoundingNewCity { origin };
        Ok(())
    }

    pub fn start_improvement(&mut self, kind: ImprovementKind) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        let city = self.selected_city()?;
        self.world.start_improvement(city, kind)
    }

    pub fn start_recruitment(&mut self, kind: UnitKind) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        let city = self.selected_city()?;
        self.world.start_recruitment(city, kind)
    }

    // ========================================================================
    // TURNS AND ROUNDS
    // ========================================================================

    /// Hand the turn to the next player, closing the round after the last one
    pub fn end_turn(&mut self) -> Result<(), ActionError> {
        if self.game_over {
            return Err(ActionError::GameOver);
        }
        self.reset_selection();

        if self.current + 1 >= self.roster.len() {
            self.end_round();
            if self.game_over {
                return Ok(());
            }
            self.current = 0;
        } else {
            self.current += 1;
        }

        self.refresh_current_economy();
        if let Some(id) = self.current_player_id() {
            tracing::info!(player = %id, round = self.round, "turn started");
        }
        Ok(())
    }

    /// Alias of [`TurnEngine::end_turn`]
    pub fn next_player(&mut self) -> Result<(), ActionError> {
        self.end_turn()
    }

    /// Eliminate players without military, then either finish the game or
    /// refresh every entity and start the next round
    pub fn end_round(&mut self) {
        tracing::info!(round = self.round, "round ended");

        let defeated: Vec<PlayerId> = self
            .roster
            .iter()
            .copied()
            .filter(|&id| self.world.player(id).map_or(true, Player::is_defeated))
            .collect();
        for id in &defeated {
            tracing::info!(player = %id, "player eliminated");
            self.roster.retain(|p| p != id);
            self.world.remove_player(*id);
        }
        if self.current >= self.roster.len() {
            self.current = 0;
        }

        if self.roster.len() <= 1 {
            self.game_over = true;
            self.player_scores = self.world.final_scores();
            self.game_over_message = match self.roster.first() {
                Some(winner) => format!("Game over! {winner} wins!"),
                None => "Game over! Draw, no players remain.".to_string(),
            };
            tracing::info!(outcome = %self.game_over_message, scores = ?self.player_scores, "game over");
            return;
        }

        self.world.end_round();
        self.round += 1;
        tracing::info!(round = self.round, "round started");
    }

    fn refresh_current_economy(&mut self) {
        if let Some(id) = self.current_player_id() {
            self.world.refresh_economy(id);
        }
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn save_game(&self, path: &Path) -> Result<(), PersistenceError> {
        save::save_to_path(self, path)
    }

    /// Replace this game with the one in `path`. On error the current game
    /// is left untouched.
    pub fn load_game(&mut self, path: &Path) -> Result<(), PersistenceError> {
        let loaded = save::load_from_path(path, self.world.config().clone())?;
        *self = loaded;
        Ok(())
    }
}
