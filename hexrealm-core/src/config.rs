//! Game setup and balance knobs

use crate::board::MAX_EXTENT;
use crate::resources::Resources;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a new game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board rows
    pub rows: u32,
    /// Tiles per row
    pub cols: u32,
    /// Number of players, numbered from 1
    pub player_count: u8,
    /// Random seed for terrain, placement and combat (None = from entropy)
    pub seed: Option<u64>,
    /// Stockpile each player starts with
    pub starting_resources: Resources,
    /// Hp restored to dug-in units at round end
    pub dug_in_regen: i32,
    /// Hp restored to cities at round end
    pub city_regen: i32,
    /// No two cities may be founded within this distance
    pub founding_radius: u32,
    /// Food eaten per unit per round
    pub unit_upkeep: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 30,
            player_count: 2,
            seed: None,
            starting_resources: Resources::new(2000, 2000, 2000, 0, 20),
            dug_in_regen: 10,
            city_regen: 5,
            founding_radius: 5,
            unit_upkeep: 1,
        }
    }
}

impl GameConfig {
    /// Read a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.rows > 0 && self.cols > 0, "board must not be empty");
        anyhow::ensure!(
            self.rows <= MAX_EXTENT && self.cols <= MAX_EXTENT,
            "board may be at most {MAX_EXTENT}x{MAX_EXTENT}"
        );
        anyhow::ensure!(self.player_count >= 1, "at least one player is required");
        anyhow::ensure!(
            (self.player_count as u64) <= self.rows as u64 * self.cols as u64,
            "board too small for {} players",
            self.player_count
        );
        Ok(())
    }

    /// Set board size
    pub fn with_board(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_players(mut self, player_count: u8) -> Self {
        self.player_count = player_count;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_starting_resources(mut self, resources: Resources) -> Self {
        self.starting_resources = resources;
        self
    }
}
