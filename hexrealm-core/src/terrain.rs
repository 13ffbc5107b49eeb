//! Terrain kinds and movement costs

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terrain of a tile, fixed at board generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Grass,
    Sand,
    Mountain,
}

impl Terrain {
    pub const ALL: [Terrain; 3] = [Terrain::Grass, Terrain::Sand, Terrain::Mountain];

    /// Movement points spent entering a tile of this terrain
    pub const fn movement_cost(self) -> u32 {
        match self {
            Terrain::Grass => 1,
            Terrain::Sand => 1,
            Terrain::Mountain => 5,
        }
    }

    /// Name used in save files
    pub const fn name(self) -> &'static str {
        match self {
            Terrain::Grass => "grass",
            Terrain::Sand => "sand",
            Terrain::Mountain => "mountain",
        }
    }

    /// Uniform pick, as done by map generation
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Terrain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| s.to_string())
    }
}
